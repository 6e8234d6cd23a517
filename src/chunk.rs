//! Worst-case compressed size bound for chunked collections
//!
//! A chunk concatenates one or more data collections, each led by a fixed
//! 12-byte collection header whose last two bytes carry the big-endian byte
//! length of the collection's data. Chunk framing itself (entity headers,
//! timestamps, version ids) lives outside the codec; the only thing callers
//! need from the codec side is an upper bound on the compressed size for
//! sizing the destination buffer when the input turns out incompressible.

/// Byte size of the generic compression entity header
pub const GENERIC_HEADER_SIZE: u32 = 32;

/// Byte size of the non-imagette specific entity header
pub const SPECIFIC_NON_IMAGETTE_HEADER_SIZE: u32 = 32;

/// Byte size of the full non-imagette entity header
pub const NON_IMAGETTE_HEADER_SIZE: u32 =
    GENERIC_HEADER_SIZE + SPECIFIC_NON_IMAGETTE_HEADER_SIZE;

/// Byte size of one collection header inside a chunk
pub const COLLECTION_HDR_SIZE: u32 = 12;

/// Bytes reserved per collection for its compressed-size field
pub const COLLECTION_FIELD_SIZE: u32 = 2;

/// Largest byte size a compression entity can represent
pub const CMP_ENTITY_MAX_SIZE: u32 = 0x00FF_FFFF;

/// Round up to the next multiple of 4
pub const fn round_up_4(x: u32) -> u32 {
    (x + 3) / 4 * 4
}

/// Worst-case compressed size of a chunk with a known collection count
///
/// `round_up_4(NON_IMAGETTE_HEADER_SIZE + num_col * COLLECTION_FIELD_SIZE +
/// chunk_size)`, guarded by the entity limits. Returns 0 when a
/// precondition is violated. Being `const`, the bound can size stack or
/// static destination buffers at compile time.
///
/// # Example
/// ```
/// use fluxcodec::chunk::compress_chunk_bound;
///
/// const DST_SIZE: u32 = compress_chunk_bound(1000, 3);
/// assert_eq!(DST_SIZE, 1072);
/// ```
pub const fn compress_chunk_bound(chunk_size: u32, num_col: u32) -> u32 {
    if num_col == 0 || num_col > CMP_ENTITY_MAX_SIZE / COLLECTION_HDR_SIZE {
        return 0;
    }
    if chunk_size < COLLECTION_HDR_SIZE * num_col || chunk_size > CMP_ENTITY_MAX_SIZE {
        return 0;
    }

    let bound = round_up_4(NON_IMAGETTE_HEADER_SIZE + num_col * COLLECTION_FIELD_SIZE + chunk_size);
    if bound > CMP_ENTITY_MAX_SIZE {
        return 0;
    }
    bound
}

/// Data byte length announced by a collection header
fn collection_data_length(hdr: &[u8]) -> usize {
    usize::from(u16::from_be_bytes([hdr[10], hdr[11]]))
}

/// Count the collections of a chunk by walking its headers
///
/// `None` when the chunk is not a clean concatenation of collections.
fn count_collections(chunk: &[u8]) -> Option<u32> {
    let hdr_size = COLLECTION_HDR_SIZE as usize;
    let mut offset = 0usize;
    let mut num_col = 0u32;

    while offset < chunk.len() {
        if chunk.len() - offset < hdr_size {
            return None;
        }
        let data_len = collection_data_length(&chunk[offset..offset + hdr_size]);
        offset += hdr_size + data_len;
        num_col += 1;
    }

    if offset == chunk.len() {
        Some(num_col)
    } else {
        None
    }
}

/// Worst-case compressed size of a chunk, counting its collections
///
/// Walks the collection headers to find `num_col`, then applies
/// [`compress_chunk_bound`]. Returns 0 when the chunk is malformed or the
/// bound would exceed [`CMP_ENTITY_MAX_SIZE`]. Useful for sizing the
/// destination buffer of a chunk compression.
pub fn compress_chunk_cmp_size_bound(chunk: &[u8]) -> u32 {
    if chunk.len() > CMP_ENTITY_MAX_SIZE as usize {
        log::error!("chunk of {} bytes exceeds the entity size limit", chunk.len());
        return 0;
    }

    match count_collections(chunk) {
        Some(num_col) => compress_chunk_bound(chunk.len() as u32, num_col),
        None => {
            log::error!("chunk is not a clean concatenation of collections");
            0
        }
    }
}
