mod galois;

// Reed-Solomon error correction
//------------------------------------------------------------------------------

/// Computes `ec_len` parity codewords for a data block: the remainder of
/// `data(x) * x^ec_len` divided by the generator polynomial with roots
/// α^0 .. α^(ec_len - 1).
pub fn ecc(data: &[u8], ec_len: usize) -> Vec<u8> {
    let gen = generator_poly(ec_len);

    let mut parity = vec![0u8; ec_len];
    for &byte in data {
        let factor = byte ^ parity[0];
        parity.rotate_left(1);
        parity[ec_len - 1] = 0;
        for (p, &g) in parity.iter_mut().zip(gen[1..].iter()) {
            *p ^= galois::mul(factor, g);
        }
    }
    parity
}

/// Generator polynomial `(x - α^0)(x - α^1)...(x - α^(ec_len-1))`,
/// coefficients highest degree first, leading coefficient 1.
fn generator_poly(ec_len: usize) -> Vec<u8> {
    debug_assert!((1..=68).contains(&ec_len), "Invalid ec length: {ec_len}");

    let mut poly = vec![1u8];
    for i in 0..ec_len {
        let mut next = vec![0u8; poly.len() + 1];
        let root = galois::exp(i);
        for (j, &coeff) in poly.iter().enumerate() {
            next[j] ^= coeff;
            next[j + 1] ^= galois::mul(coeff, root);
        }
        poly = next;
    }
    poly
}
