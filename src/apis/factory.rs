use crate::apis::base::SourceAdapter;
use crate::config::SourceDescriptor;
use crate::error::Result;

/// Build one adapter per descriptor, keeping configured order
pub fn create_adapters(sources: &[SourceDescriptor]) -> Result<Vec<SourceAdapter>> {
    sources.iter().cloned().map(SourceAdapter::new).collect()
}
