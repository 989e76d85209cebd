//! Internal constants, register offsets, and bit definitions.

/// Number of GPIO pins exposed by the BCM283x register bank.
pub const PIN_COUNT: u8 = 54;

/// Device node giving unprivileged access to the GPIO block only.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/gpiomem";
/// Device node exposing all physical memory (needs root).
pub const DEVMEM_DEVICE_PATH: &str = "/dev/mem";
/// Offset of the GPIO block from the peripheral base address.
pub const GPIO_BLOCK_OFFSET: u64 = 0x0020_0000;

/// Minimum number of core cycles the pull handshake waits between phases.
pub const MIN_SETTLE_CYCLES: u32 = 150;

// --- Register Map (byte offsets from the mapping base) ---
pub mod regs {
    pub const GPFSEL: usize = 0x00;
    pub const GPFSEL_WORDS: usize = 6;
    pub const GPSET: usize = 0x1C;
    pub const GPCLR: usize = 0x28;
    pub const GPLEV: usize = 0x34;
    pub const GPEDS: usize = 0x40;
    pub const GPREN: usize = 0x4C;
    pub const GPFEN: usize = 0x58;
    pub const GPHEN: usize = 0x64;
    pub const GPLEN: usize = 0x70;
    pub const GPAREN: usize = 0x7C;
    pub const GPAFEN: usize = 0x88;
    pub const GPPUD: usize = 0x94;
    pub const GPPUDCLK: usize = 0x98;
    // Every per-pin bitmap spans two words (pins 0-31, 32-53)
    pub const BANK_WORDS: usize = 2;

    /// Bytes covered by the register map, up to and including GPPUDCLK1.
    pub const SPAN: usize = GPPUDCLK + BANK_WORDS * 4;
}

// --- Function Select Field ---
pub mod fsel {
    pub const PINS_PER_WORD: u8 = 10;
    pub const FIELD_WIDTH: u8 = 3;
    pub const FIELD_MASK: u32 = 0b111;
    pub const INPUT: u32 = 0b000;
    pub const OUTPUT: u32 = 0b001;
}

// --- Pull Control Codes (GPPUD bits 1:0) ---
pub mod pud {
    pub const CONTROL_MASK: u32 = 0b11;
    pub const OFF: u32 = 0b00;
    pub const PULL_DOWN: u32 = 0b01;
    pub const PULL_UP: u32 = 0b10;
}
