//! # qrforge
//!
//! A Rust library for generating QR and Micro QR codes with Reed-Solomon error
//! correction.
//!
//! ## Features
//!
//! - **QR Code Generation**: Create QR codes with customizable versions, error correction
//!   levels and mask patterns
//! - **Micro QR Support**: Symbols M1 through M4 with their reduced mode and format rules
//! - **Optimal Segmentation**: Splits data into Numeric, Alphanumeric, Byte and Kanji
//!   segments to minimize the encoded length
//! - **Reed-Solomon Error Correction**: Built-in error correction with configurable
//!   levels (L, M, Q, H)
//! - **ECI & GS1**: Extended Channel Interpretation headers and FNC1 (GS1) symbols
//!
//! ## Quick Start
//!
//! ### Simple QR Code Generation
//!
//! ```rust
//! use qrforge::QRBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Simplest usage - provide only data, all other settings are automatically chosen
//! let qr = QRBuilder::new(b"Hello, World!").build()?;
//!
//! println!("{}", qr.to_str(1));
//! # Ok(())
//! # }
//! ```
//!
//! ### Full Configuration
//!
//! ```rust
//! use qrforge::{ECLevel, MaskPattern, QRBuilder, Version};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = "Hello, World!";
//! let qr = QRBuilder::new(data.as_bytes())
//!     .version(Version::Normal(2))  // QR version (size) - if not provided, finds smallest version to fit data
//!     .ec_level(ECLevel::M)         // Minimum error correction level - if not provided, defaults to ECLevel::L
//!     .mask(MaskPattern::new(3))    // Mask pattern - if not provided, finds best mask based on penalty score
//!     .build()?;
//!
//! println!("{}", qr.to_str(1));
//! # Ok(())
//! # }
//! ```
//!
//! ### Micro QR
//!
//! ```rust
//! use qrforge::{QRBuilder, Version};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let qr = QRBuilder::new(b"12345678").version(Version::Micro(2)).build()?;
//!
//! assert_eq!(qr.width(), 13);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub(crate) mod common;

pub use builder::{Module, QRBuilder, Row, QR};
pub use common::error::{QRError, QRResult};
pub use common::mask::{compute_micro_score, compute_total_penalty, MaskPattern};
pub use common::metadata::{ECLevel, Metadata, Version};
