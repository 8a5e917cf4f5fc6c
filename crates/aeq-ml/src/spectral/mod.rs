//! Mel-domain forward and inverse transforms
//!
//! Forward: centered STFT → power → mel filterbank → dB relative to the
//! chunk's own peak. Inverse: dB → power → pseudo-inverse projection back to
//! linear bins → magnitude → Griffin-Lim phase recovery.
//!
//! Every chunk is referenced to its own maximum, so absolute level is lost
//! in the mel representation; the loudness matcher restores it afterwards.

mod forward;
mod griffin_lim;
mod inverse;
mod mel;
mod projection;
mod scale;
mod stft;

pub use forward::MelAnalyzer;
pub use griffin_lim::GriffinLim;
pub use inverse::MelSynthesizer;
pub use mel::{hz_to_mel, mel_filterbank, mel_to_hz};
pub use projection::MelProjection;
pub use scale::{db_to_power, power_to_db};
pub use stft::{Stft, hann_window};
