//! # Command Encoding
//!
//! Purpose: Build the single request line sent to the daemon for each verb.
//!
//! ## Design Principles
//! 1. **One Line**: Output never contains a newline; the transport adds it.
//! 2. **Validate Early**: Names and keys that would break framing are
//!    rejected before anything touches the network.
//! 3. **Optional Hashing**: With hash-keys on, every key is replaced by the
//!    hex SHA-256 digest of its bytes.

use sha2::{Digest, Sha256};

use bloomd_common::Verb;

use crate::error::{ClientError, ClientResult};

/// Optional parameters for `create`.
///
/// Zero values ask the daemon for its defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CreateParams {
    /// Key capacity; 0 uses the daemon default.
    pub capacity: u64,
    /// False-positive probability; 0 uses the daemon default.
    pub probability: f64,
    /// Keep the filter in memory only.
    pub in_memory: bool,
}

impl CreateParams {
    fn validate(&self) -> ClientResult<()> {
        if !self.probability.is_finite() || self.probability < 0.0 || self.probability >= 1.0 {
            return Err(ClientError::InvalidArgument(format!(
                "probability {} outside [0, 1)",
                self.probability
            )));
        }
        if self.probability > 0.0 && self.capacity < 1 {
            return Err(ClientError::InvalidArgument(
                "probability requires a positive capacity".to_string(),
            ));
        }
        Ok(())
    }
}

/// Encodes request lines, applying the key hashing policy.
#[derive(Debug, Clone, Copy)]
pub struct CommandEncoder {
    hash_keys: bool,
}

impl CommandEncoder {
    pub fn new(hash_keys: bool) -> Self {
        CommandEncoder { hash_keys }
    }

    /// `<verb> <name>` for drop, close, clear and info.
    pub fn filter_command(&self, verb: Verb, name: &str) -> ClientResult<String> {
        let mut line = start_line(verb);
        push_name(&mut line, name)?;
        Ok(line)
    }

    /// `<verb> <name> <key>` for set and check.
    pub fn key_command(&self, verb: Verb, name: &str, key: &str) -> ClientResult<String> {
        let mut line = start_line(verb);
        push_name(&mut line, name)?;
        self.push_key(&mut line, key)?;
        Ok(line)
    }

    /// `<verb> <name> <key>...` for bulk and multi.
    pub fn keys_command<K: AsRef<str>>(
        &self,
        verb: Verb,
        name: &str,
        keys: &[K],
    ) -> ClientResult<String> {
        if keys.is_empty() {
            return Err(ClientError::InvalidArgument(format!(
                "{} needs at least one key",
                verb
            )));
        }
        let mut line = start_line(verb);
        push_name(&mut line, name)?;
        for key in keys {
            self.push_key(&mut line, key.as_ref())?;
        }
        Ok(line)
    }

    /// `create <name> [capacity=N] [prob=P] [in_memory=1]`.
    pub fn create(&self, name: &str, params: &CreateParams) -> ClientResult<String> {
        params.validate()?;
        let mut line = start_line(Verb::Create);
        push_name(&mut line, name)?;
        if params.capacity > 0 {
            line.push_str(&format!(" capacity={}", params.capacity));
        }
        if params.probability > 0.0 {
            line.push_str(&format!(" prob={}", params.probability));
        }
        if params.in_memory {
            line.push_str(" in_memory=1");
        }
        Ok(line)
    }

    /// `list [prefix]`.
    pub fn list(&self, prefix: Option<&str>) -> ClientResult<String> {
        let mut line = start_line(Verb::List);
        if let Some(prefix) = prefix {
            push_name(&mut line, prefix)?;
        }
        Ok(line)
    }

    /// `flush [name]`.
    pub fn flush(&self, name: Option<&str>) -> ClientResult<String> {
        let mut line = start_line(Verb::Flush);
        if let Some(name) = name {
            push_name(&mut line, name)?;
        }
        Ok(line)
    }

    fn push_key(&self, line: &mut String, key: &str) -> ClientResult<()> {
        line.push(' ');
        if self.hash_keys {
            line.push_str(&hash_key(key));
            return Ok(());
        }
        check_token("key", key)?;
        line.push_str(key);
        Ok(())
    }
}

/// Lowercase hex SHA-256 digest of the key bytes.
pub fn hash_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

fn start_line(verb: Verb) -> String {
    let mut line = String::with_capacity(64);
    line.push_str(verb.token());
    line
}

fn push_name(line: &mut String, name: &str) -> ClientResult<()> {
    check_token("filter name", name)?;
    line.push(' ');
    line.push_str(name);
    Ok(())
}

fn check_token(what: &str, token: &str) -> ClientResult<()> {
    if token.is_empty() {
        return Err(ClientError::InvalidArgument(format!("{} is empty", what)));
    }
    if token.chars().any(char::is_whitespace) {
        return Err(ClientError::InvalidArgument(format!(
            "{} {:?} contains whitespace",
            what, token
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_filter_commands() {
        let enc = CommandEncoder::new(false);
        assert_eq!(enc.filter_command(Verb::Drop, "users").unwrap(), "drop users");
        assert_eq!(enc.filter_command(Verb::Info, "users").unwrap(), "info users");
        assert_eq!(enc.key_command(Verb::Set, "users", "bob").unwrap(), "s users bob");
        assert_eq!(enc.key_command(Verb::Check, "users", "bob").unwrap(), "c users bob");
    }

    #[test]
    fn encodes_key_lists_in_order() {
        let enc = CommandEncoder::new(false);
        let line = enc.keys_command(Verb::Bulk, "f", &["a", "b", "c"]).unwrap();
        assert_eq!(line, "b f a b c");
        let line = enc
            .keys_command(Verb::Multi, "f", &vec!["x".to_string(), "y".to_string()])
            .unwrap();
        assert_eq!(line, "m f x y");
    }

    #[test]
    fn rejects_empty_key_list() {
        let enc = CommandEncoder::new(false);
        let keys: [&str; 0] = [];
        assert!(matches!(
            enc.keys_command(Verb::Bulk, "f", &keys),
            Err(ClientError::InvalidArgument(_))
        ));
    }

    #[test]
    fn create_suffixes_only_when_set() {
        let enc = CommandEncoder::new(false);
        assert_eq!(enc.create("f", &CreateParams::default()).unwrap(), "create f");

        let params = CreateParams {
            capacity: 100000,
            probability: 0.0001,
            in_memory: true,
        };
        assert_eq!(
            enc.create("f", &params).unwrap(),
            "create f capacity=100000 prob=0.0001 in_memory=1"
        );

        let params = CreateParams {
            capacity: 500,
            ..Default::default()
        };
        assert_eq!(enc.create("f", &params).unwrap(), "create f capacity=500");
    }

    #[test]
    fn create_rejects_probability_without_capacity() {
        let enc = CommandEncoder::new(false);
        let params = CreateParams {
            probability: 0.01,
            ..Default::default()
        };
        assert!(matches!(
            enc.create("f", &params),
            Err(ClientError::InvalidArgument(_))
        ));

        let params = CreateParams {
            capacity: 10,
            probability: 1.5,
            in_memory: false,
        };
        assert!(enc.create("f", &params).is_err());
    }

    #[test]
    fn optional_arguments() {
        let enc = CommandEncoder::new(false);
        assert_eq!(enc.list(None).unwrap(), "list");
        assert_eq!(enc.list(Some("user")).unwrap(), "list user");
        assert_eq!(enc.flush(None).unwrap(), "flush");
        assert_eq!(enc.flush(Some("users")).unwrap(), "flush users");
    }

    #[test]
    fn rejects_whitespace_in_tokens() {
        let enc = CommandEncoder::new(false);
        assert!(enc.filter_command(Verb::Drop, "two words").is_err());
        assert!(enc.filter_command(Verb::Drop, "").is_err());
        assert!(enc.key_command(Verb::Set, "f", "new\nline").is_err());
    }

    #[test]
    fn hashes_keys_when_enabled() {
        let enc = CommandEncoder::new(true);
        let line = enc.key_command(Verb::Set, "f", "abc").unwrap();
        assert_eq!(
            line,
            "s f ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        // Hashing makes otherwise unsendable keys safe.
        let line = enc.key_command(Verb::Check, "f", "has space").unwrap();
        assert_eq!(line.split(' ').count(), 3);
        assert_eq!(line.split(' ').nth(2).unwrap().len(), 64);
    }
}
