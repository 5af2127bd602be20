//! Internet 校验和（RFC 1071）

/// 对 `data` 计算 16 位反码和的反码。奇数长度时末尾补 0。
pub fn internet_checksum(data: &[u8]) -> u16 {
    let mut accum: u32 = 0;
    let mut words = data.chunks_exact(2);
    for w in &mut words {
        accum += u16::from_be_bytes([w[0], w[1]]) as u32;
    }
    if let [last] = words.remainder() {
        accum += (*last as u32) << 8;
    }
    while accum > 0xffff {
        accum = (accum & 0xffff) + (accum >> 16);
    }
    !(accum as u16)
}
