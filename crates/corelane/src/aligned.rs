//! The aligned-buffer collaborator: a trait boundary only.
//!
//! Direct-I/O and page-aligned buffer allocation live in a kernel-abstraction
//! collaborator outside this crate; this module exists only so higher layers
//! built on [`Lane`](crate::lane::Lane) have a shared trait to depend on before
//! that collaborator exists. No allocator-backed implementation is provided
//! here — adding one would duplicate work that belongs to whichever crate
//! actually owns the Direct-I/O alignment requirements.

/// A byte buffer whose backing storage honors a specific alignment.
///
/// Implemented elsewhere (outside this crate's scope); this trait only fixes
/// the shape higher layers can depend on.
pub trait AlignedBuffer {
    /// The buffer's length in bytes.
    fn byte_count(&self) -> usize;

    /// The alignment, in bytes, guaranteed for the start of the buffer.
    fn alignment(&self) -> usize;

    /// Returns a view into the buffer that is deliberately misaligned relative
    /// to [`alignment`](Self::alignment), for exercising a higher layer's own
    /// alignment assertions without needing a real allocator-backed
    /// implementation to misbehave with.
    #[cfg(test)]
    fn misaligned_view(&self) -> &[u8];
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        bytes: Vec<u8>,
        alignment: usize,
    }

    impl AlignedBuffer for Fixture {
        fn byte_count(&self) -> usize {
            self.bytes.len()
        }

        fn alignment(&self) -> usize {
            self.alignment
        }

        fn misaligned_view(&self) -> &[u8] {
            &self.bytes[1..]
        }
    }

    #[test]
    fn trait_shape_is_usable_by_a_test_fixture() {
        let fixture = Fixture {
            bytes: vec![0u8; 64],
            alignment: 64,
        };
        assert_eq!(fixture.byte_count(), 64);
        assert_eq!(fixture.alignment(), 64);
        assert_eq!(fixture.misaligned_view().len(), 63);
    }
}
