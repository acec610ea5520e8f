/// An alphabet and padding pair describing one base32 variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Base32Format {
    alphabet: &'static [u8; 32],
    padding: Option<u8>,
}

/// RFC 4648 base32, `A-Z2-7` padded with `=`
pub const RFC4648: Base32Format = Base32Format::new(b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567", Some(b'='));

/// RFC 4648 base32 with extended hex alphabet, `0-9A-V` padded with `=`
pub const RFC4648_HEX: Base32Format =
    Base32Format::new(b"0123456789ABCDEFGHIJKLMNOPQRSTUV", Some(b'='));

/// Crockford's base32, no padding
pub const CROCKFORD: Base32Format = Base32Format::new(b"0123456789ABCDEFGHJKMNPQRSTVWXYZ", None);

/// Error returned when base32 text contains a character outside the alphabet
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid base32 character {character:?} at position {position}")]
pub struct DecodeError {
    /// The offending character
    pub character: char,
    /// Its position in the input, counted in characters
    pub position: usize,
}

impl Base32Format {
    /// Create a format from an alphabet of 32 ASCII symbols and an optional padding byte
    pub const fn new(alphabet: &'static [u8; 32], padding: Option<u8>) -> Self {
        Self { alphabet, padding }
    }

    /// The padding character, if this format pads its output
    pub fn padding(&self) -> Option<char> {
        self.padding.map(char::from)
    }

    /// Encode bytes, packing 5 bits per symbol from the most significant bit
    ///
    /// Output is padded to a multiple of 8 symbols when the format has padding.
    pub fn encode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len().div_ceil(5) * 8);
        let mut buffer = 0u32;
        let mut bits = 0u32;
        for &byte in bytes {
            buffer = (buffer << 8) | u32::from(byte);
            bits += 8;
            while bits >= 5 {
                bits -= 5;
                out.push(self.symbol(buffer >> bits));
            }
            buffer &= (1 << bits) - 1;
        }
        if bits > 0 {
            out.push(self.symbol(buffer << (5 - bits)));
        }
        if let Some(pad) = self.padding {
            while out.len() % 8 != 0 {
                out.push(char::from(pad));
            }
        }
        out
    }

    /// Decode base32 text
    ///
    /// Trailing padding is stripped, lowercase letters are accepted, and
    /// leftover bits that do not fill a byte are discarded.
    pub fn decode(&self, text: &str) -> Result<Vec<u8>, DecodeError> {
        let text = match self.padding() {
            Some(pad) => text.trim_end_matches(pad),
            None => text,
        };
        let mut out = Vec::with_capacity(text.len() * 5 / 8);
        let mut buffer = 0u32;
        let mut bits = 0u32;
        for (position, character) in text.chars().enumerate() {
            let value = self
                .value_of(character)
                .ok_or(DecodeError { character, position })?;
            buffer = (buffer << 5) | value;
            bits += 5;
            if bits >= 8 {
                bits -= 8;
                out.push((buffer >> bits) as u8);
                buffer &= (1 << bits) - 1;
            }
        }
        Ok(out)
    }

    fn symbol(&self, index: u32) -> char {
        char::from(self.alphabet[(index & 0x1f) as usize])
    }

    fn value_of(&self, character: char) -> Option<u32> {
        if !character.is_ascii() {
            return None;
        }
        let lookup = |byte: u8| self.alphabet.iter().position(|&symbol| symbol == byte);
        let byte = character as u8;
        lookup(byte)
            .or_else(|| lookup(byte.to_ascii_uppercase()))
            .map(|index| index as u32)
    }
}

/// Encode bytes as padded RFC 4648 base32
pub fn encode(bytes: &[u8]) -> String {
    RFC4648.encode(bytes)
}

/// Decode RFC 4648 base32 text, padded or not
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    RFC4648.decode(text)
}
