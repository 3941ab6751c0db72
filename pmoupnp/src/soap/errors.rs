use thiserror::Error;

#[derive(Error, Debug)]
pub enum SoapError {
    #[error("XML serialization error: {0}")]
    Xml(#[from] xmltree::Error),

    #[error("Invalid UTF-8 in serialized XML: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
