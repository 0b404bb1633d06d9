//! One-off document analysis from the command line.

use std::path::Path;

use console::style;

use crate::analysis::{AnalysisPipeline, PromptTemplate};
use crate::config::Config;
use crate::utils::detect_mime;

pub async fn cmd_analyze(
    config: &Config,
    file: &Path,
    template: PromptTemplate,
    mime: Option<&str>,
    vars: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", file.display(), e))?;
    let filename = file.file_name().and_then(|n| n.to_str());
    let mime_type = detect_mime(&bytes, filename, mime);

    let llm = crate::llm::init(config.llm.clone())?;
    let pipeline = AnalysisPipeline::new(llm);

    eprintln!(
        "{} Analyzing {} ({}) with {} via {}",
        style("→").cyan(),
        file.display(),
        mime_type,
        template.as_str(),
        pipeline.llm().backend_name()
    );

    let mut request = pipeline
        .request_from_file(bytes, &mime_type, template)
        .await?;
    request.vars = vars;

    let result = pipeline.run(&request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
