pub type CapResult<T> = Result<T, CapError>;

#[derive(thiserror::Error, Debug)]
pub enum CapError {
    /// The source bytes are not a decodable raster.
    #[error("decode error: {0}")]
    Decode(String),

    /// The cap graphic could not be loaded or rasterized.
    #[error("asset load error: {0}")]
    AssetLoad(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CapError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoad(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(CapError::decode("x").to_string().contains("decode error:"));
        assert!(
            CapError::asset_load("x")
                .to_string()
                .contains("asset load error:")
        );
        assert!(CapError::encode("x").to_string().contains("encode error:"));
        assert!(CapError::read("x").to_string().contains("read error:"));
        assert!(
            CapError::validation("x")
                .to_string()
                .contains("validation error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = CapError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
