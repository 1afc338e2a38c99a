use crc32fast::Hasher;

/// CRC32 over a full page image, treating the 4-byte checksum field at
/// `checksum_offset` as zero.
pub fn calculate_page_checksum(page: &[u8], checksum_offset: usize) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&page[..checksum_offset]);
    hasher.update(&[0u8; 4]);
    hasher.update(&page[checksum_offset + 4..]);
    hasher.finalize()
}

pub fn verify_page_checksum(page: &[u8], checksum_offset: usize, expected_checksum: u32) -> bool {
    calculate_page_checksum(page, checksum_offset) == expected_checksum
}

/// Plain CRC32 of a byte run, used for journal records and the file header.
pub fn checksum(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}
