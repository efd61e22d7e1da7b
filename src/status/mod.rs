/*!
 * Status Module
 * Decoding of raw child state changes into structured records
 */

pub mod decoder;
pub mod types;

pub use decoder::{decode, decode_raw};
pub use types::{ChildState, ChildStatus, StatusRecord, SIGNAL_EXIT_BASE};
