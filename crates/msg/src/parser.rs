//! MSG file parser implementation.
//!
//! Reads string properties straight from their substorage streams. Property
//! streams come in two flavours: `001F` (UTF-16LE) and `001E` (8-bit in the
//! message code page). Only the top-level message is read; attachments and
//! recipients live in sub-storages and are ignored.

use cfb::CompoundFile;
use star_core::{Error, Result};
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// Stream name prefix for string and binary properties.
const SUBSTG_PREFIX: &str = "__substg1.0_";

/// Property stream that every well-formed message carries.
const PROPERTIES_STREAM: &str = "/__properties_version1.0";

/// MAPI property tags (high word of the property id).
mod tags {
    pub const SUBJECT: u16 = 0x0037;
    pub const SENT_REPRESENTING_NAME: u16 = 0x0042;
    pub const SENDER_NAME: u16 = 0x0C1A;
    pub const SENDER_EMAIL_ADDRESS: u16 = 0x0C1F;
    pub const BODY: u16 = 0x1000;
    pub const SENDER_SMTP_ADDRESS: u16 = 0x5D01;
}

/// String property encodings.
const PT_UNICODE: u16 = 0x001F;
const PT_STRING8: u16 = 0x001E;

/// The fields of an email the pipeline cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailMessage {
    pub sender: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    /// Render the message as plain text for the report pipeline.
    pub fn to_text(&self) -> String {
        format!(
            "寄件人：{}\n主旨：{}\n\n--- 內文 ---\n{}",
            self.sender, self.subject, self.body
        )
    }
}

/// Parser for Outlook .msg files.
#[derive(Debug, Default, Clone, Copy)]
pub struct MsgParser;

impl MsgParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a message from raw bytes.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<EmailMessage> {
        self.parse(Cursor::new(bytes))
    }

    /// Parse a message file on disk.
    pub fn parse_path(&self, path: impl AsRef<Path>) -> Result<EmailMessage> {
        let file = std::fs::File::open(path.as_ref())?;
        self.parse(file)
    }

    /// Parse a message from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<EmailMessage> {
        let mut cfb = CompoundFile::open(reader)
            .map_err(|e| Error::CfbError(format!("Failed to open CFB container: {}", e)))?;

        self.validate_cfb_structure(&cfb)?;

        let sender_name = self
            .read_string(&mut cfb, tags::SENDER_NAME)?
            .or(self.read_string(&mut cfb, tags::SENT_REPRESENTING_NAME)?);
        let sender_address = self
            .read_string(&mut cfb, tags::SENDER_SMTP_ADDRESS)?
            .or(self.read_string(&mut cfb, tags::SENDER_EMAIL_ADDRESS)?);

        let message = EmailMessage {
            sender: format_sender(sender_name, sender_address),
            subject: self.read_string(&mut cfb, tags::SUBJECT)?.unwrap_or_default(),
            body: self.read_string(&mut cfb, tags::BODY)?.unwrap_or_default(),
        };

        log::debug!(
            "MSG parsed: sender='{}', subject='{}', body={} chars",
            message.sender,
            message.subject,
            message.body.chars().count()
        );

        Ok(message)
    }

    /// Check the container looks like a message: at least one property
    /// stream at the root.
    fn validate_cfb_structure<R: Read + Seek>(&self, cfb: &CompoundFile<R>) -> Result<()> {
        let has_properties = cfb.walk().any(|entry| {
            entry.is_stream()
                && entry
                    .path()
                    .to_string_lossy()
                    .trim_start_matches('/')
                    .starts_with(SUBSTG_PREFIX)
        });

        if !has_properties {
            return Err(Error::UnsupportedFormat(
                "No message property streams found. This may not be an Outlook .msg file."
                    .to_string(),
            ));
        }

        if !cfb.is_stream(PROPERTIES_STREAM) {
            log::warn!("Missing property stream; message may come from a non-Outlook writer");
        }

        Ok(())
    }

    /// Read a string property, preferring the Unicode stream.
    fn read_string<R: Read + Seek>(
        &self,
        cfb: &mut CompoundFile<R>,
        tag: u16,
    ) -> Result<Option<String>> {
        if let Some(data) = self.read_stream(cfb, tag, PT_UNICODE)? {
            return Ok(decode_unicode(&data));
        }
        if let Some(data) = self.read_stream(cfb, tag, PT_STRING8)? {
            return Ok(decode_string8(&data));
        }
        Ok(None)
    }

    fn read_stream<R: Read + Seek>(
        &self,
        cfb: &mut CompoundFile<R>,
        tag: u16,
        kind: u16,
    ) -> Result<Option<Vec<u8>>> {
        let path = stream_path(tag, kind);
        if !cfb.is_stream(&path) {
            return Ok(None);
        }

        let mut stream = cfb
            .open_stream(&path)
            .map_err(|e| Error::CfbError(format!("Failed to open {}: {}", path, e)))?;
        let mut data = Vec::new();
        stream
            .read_to_end(&mut data)
            .map_err(|e| Error::CfbError(format!("Failed to read {}: {}", path, e)))?;
        Ok(Some(data))
    }
}

/// Root-level stream path for a property.
fn stream_path(tag: u16, kind: u16) -> String {
    format!("/{}{:04X}{:04X}", SUBSTG_PREFIX, tag, kind)
}

/// Combine display name and address the way mail clients show them.
fn format_sender(name: Option<String>, address: Option<String>) -> String {
    match (name, address) {
        (Some(name), Some(address)) if name != address => format!("{} <{}>", name, address),
        (Some(name), _) => name,
        (None, Some(address)) => address,
        (None, None) => String::new(),
    }
}

/// Decode UTF-16LE property data, stopping at a null terminator.
fn decode_unicode(data: &[u8]) -> Option<String> {
    let units = data
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]));

    let text: String = char::decode_utf16(units)
        .take_while(|r| r.as_ref().map(|&c| c != '\0').unwrap_or(true))
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();

    non_empty(text)
}

/// Decode 8-bit property data: UTF-8 when valid, else the legacy Chinese
/// code page.
fn decode_string8(data: &[u8]) -> Option<String> {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let data = &data[..end];

    let text = match std::str::from_utf8(data) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, had_errors) = encoding_rs::GBK.decode(data);
            if had_errors {
                log::warn!("8-bit message property has undecodable bytes");
            }
            text.into_owned()
        }
    };

    non_empty(text)
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
