//! Building the unimodal bindings of a campaign.

use harmonia_transform::{PipelineContext, TransformError};
use tracing::info_span;

use crate::answers::read_answers;
use crate::config::CampaignConfig;
use crate::error::Result;
use crate::metadata::JsonMetadataSource;

/// Loads the metadata of every mode, then binds each mode's answers under
/// the mode name.
pub fn build_bindings(config: &CampaignConfig) -> Result<PipelineContext> {
    let span = info_span!("build_bindings", campaign = %config.campaign);
    let _guard = span.enter();

    let mut context = PipelineContext::new();
    let source = JsonMetadataSource::from_campaign(config);
    context.load_metadata(&config.mode_specs(), &source)?;

    for mode in &config.modes {
        let metadata = context
            .metadata(&mode.name)
            .ok_or_else(|| TransformError::UnknownMode(mode.name.clone()))?;
        let dataset = read_answers(&mode.data_file, metadata)?;
        context.bind(mode.name.clone(), dataset);
    }
    Ok(context)
}
