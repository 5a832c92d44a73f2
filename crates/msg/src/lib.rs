//! Outlook message (.msg) reader.
//!
//! Message files are Microsoft Compound File Binary containers; each MAPI
//! property lives in its own `__substg1.0_<tag><type>` stream.

pub mod parser;

pub use parser::{EmailMessage, MsgParser};
