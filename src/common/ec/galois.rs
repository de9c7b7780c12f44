// GF(256) arithmetic
//------------------------------------------------------------------------------

// Primitive polynomial x^8 + x^4 + x^3 + x^2 + 1.
const PRIMITIVE: u16 = 0x11D;

const fn build_exp_table() -> [u8; 256] {
    let mut exp = [0u8; 256];
    let mut x: u16 = 1;
    let mut i = 0;
    while i < 256 {
        exp[i] = x as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE;
        }
        i += 1;
    }
    exp
}

const fn build_log_table() -> [u8; 256] {
    let exp = build_exp_table();
    let mut log = [0u8; 256];
    let mut i = 0;
    // exp is periodic with period 255; exp[255] == exp[0] == 1.
    while i < 255 {
        log[exp[i] as usize] = i as u8;
        i += 1;
    }
    log
}

static EXP_TABLE: [u8; 256] = build_exp_table();
static LOG_TABLE: [u8; 256] = build_log_table();

pub fn exp(power: usize) -> u8 {
    EXP_TABLE[power % 255]
}

pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    exp(LOG_TABLE[a as usize] as usize + LOG_TABLE[b as usize] as usize)
}
