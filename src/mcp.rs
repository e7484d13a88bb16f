use std::{path::PathBuf, sync::Arc};

use rmcp::{
    ServerHandler,
    ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult,
        Content,
        Implementation,
        ServerCapabilities,
        ServerInfo,
    },
    tool,
    tool_handler,
    tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    config::EngineConfig,
    error,
    ingestion,
    paper_store::PaperStore,
    query,
    study_index::FindCriteria,
    text_source::{DocumentText, TextProvider},
};

struct SaplensState {
    config: EngineConfig,
    papers: PaperStore,
    provider: Box<dyn TextProvider>,
}

#[derive(Clone)]
pub struct SaplensMcpServer {
    state: Arc<SaplensState>,
    tool_router: ToolRouter<Self>,
}

impl SaplensMcpServer {
    fn new(state: SaplensState) -> Self {
        Self {
            state: Arc::new(state),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router(router = tool_router)]
impl SaplensMcpServer {
    #[tool(
        name = "index_sap_documents",
        description = "Index all SAP documents in the corpus, replacing the previous index. Run this once before searching."
    )]
    pub async fn index_sap_documents(
        &self,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        match ingestion::rebuild_index(
            &self.state.config,
            self.state.provider.as_ref(),
        ) {
            Ok(report) => Ok(text_result(report.to_string())),
            Err(e) => Ok(error_result(e)),
        }
    }

    #[tool(
        name = "parse_for_index",
        description = "Parse one document (PDF, DOCX, DOC) and extract study information including detected phase, therapeutic area and indication."
    )]
    pub async fn parse_for_index(
        &self,
        params: Parameters<ParseParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let path = PathBuf::from(params.0.file_path);
        match query::parse_for_index(self.state.provider.as_ref(), &path) {
            Ok(summary) => json_result(&summary),
            Err(e) => Ok(error_result(e)),
        }
    }

    #[tool(
        name = "search_primary_analysis",
        description = "Get the comprehensive analysis of an indexed study: sample size, statistical methods, endpoints and study conduct."
    )]
    pub async fn search_primary_analysis(
        &self,
        params: Parameters<StudyParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        match query::analyze_study(
            &self.state.config,
            self.state.provider.as_ref(),
            &params.0.study_id,
        ) {
            Ok(analysis) => json_result(&analysis),
            Err(e) => Ok(error_result(e)),
        }
    }

    #[tool(
        name = "find_studies",
        description = "Find indexed study ids by phase, therapeutic area and indication. Omitted criteria match everything."
    )]
    pub async fn find_studies(
        &self,
        params: Parameters<FindParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let criteria = FindCriteria {
            phase: params.phase,
            therapeutic: params.therapeutic,
            indication: params.indication,
        };
        match query::find_studies(&self.state.config, &criteria) {
            Ok(response) => json_result(&response),
            Err(e) => Ok(error_result(e)),
        }
    }

    #[tool(
        name = "extract_info",
        description = "Look up a saved paper by id across all topic folders."
    )]
    pub async fn extract_info(
        &self,
        params: Parameters<PaperParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let paper_id = params.0.paper_id;
        match self.state.papers.find(&paper_id) {
            Ok(Some(info)) => json_result(&info),
            Ok(None) => Ok(text_result(format!(
                "There's no saved information related to paper {paper_id}."
            ))),
            Err(e) => Ok(error_result(e)),
        }
    }

    #[tool(
        name = "list_topics",
        description = "List the topic folders that have saved papers."
    )]
    pub async fn list_topics(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        match self.state.papers.render_folders() {
            Ok(markdown) => Ok(text_result(markdown)),
            Err(e) => Ok(error_result(e)),
        }
    }

    #[tool(
        name = "get_topic_papers",
        description = "Show the saved papers of one topic as markdown."
    )]
    pub async fn get_topic_papers(
        &self,
        params: Parameters<TopicParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        Ok(text_result(self.state.papers.render_topic(&params.0.topic)))
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for SaplensMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_server_info(
                Implementation::new("saplens", env!("CARGO_PKG_VERSION"))
                    .with_title("saplens MCP"),
            )
            .with_instructions(
                "Run index_sap_documents first. Use find_studies to discover study ids, then search_primary_analysis for details.",
            )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParseParams {
    /// Path to the document to parse.
    pub file_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudyParams {
    /// Study id from the index, e.g. "oncology_abc123".
    pub study_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FindParams {
    /// Clinical trial phase, e.g. "Phase II".
    pub phase: Option<String>,
    /// Therapeutic area, e.g. "Oncology".
    pub therapeutic: Option<String>,
    /// Indication under study, e.g. "Lung Cancer".
    pub indication: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaperParams {
    /// Paper id as saved in a topic folder.
    pub paper_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopicParams {
    /// Research topic, with spaces or underscores.
    pub topic: String,
}

fn text_result(text: String) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text)])
}

/// Domain failures are tool results the caller can read, not protocol
/// errors.
fn error_result(error: error::Error) -> CallToolResult {
    tracing::debug!("tool failed: {error}");
    CallToolResult::error(vec![Content::text(error.to_string())])
}

fn json_result<T: Serialize>(
    value: &T,
) -> Result<CallToolResult, rmcp::ErrorData> {
    let structured = serde_json::to_value(value)
        .map_err(|e| mcp_error("failed to serialize result", e))?;
    let text = serde_json::to_string_pretty(&structured)
        .map_err(|e| mcp_error("failed to serialize result", e))?;

    let mut result = CallToolResult::success(vec![Content::text(text)]);
    result.structured_content = Some(structured);
    Ok(result)
}

fn mcp_error(message: &str, error: impl std::fmt::Display) -> rmcp::ErrorData {
    rmcp::ErrorData::internal_error(
        message.to_string(),
        Some(json!({ "error": error.to_string() })),
    )
}

pub fn run_mcp(config: EngineConfig, papers: PaperStore) -> error::Result<()> {
    let server = SaplensMcpServer::new(SaplensState {
        config,
        papers,
        provider: Box::new(DocumentText),
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            error::Error::Config(format!("failed to start tokio runtime: {e}"))
        })?;

    runtime.block_on(async move {
        let transport = rmcp::transport::stdio();
        let running = server.serve(transport).await.map_err(|e| {
            error::Error::Config(format!(
                "MCP server initialization failed: {e}"
            ))
        })?;
        running.waiting().await.map_err(|e| {
            error::Error::Config(format!("MCP server error: {e}"))
        })?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper_store::PaperInfo;

    fn server(tmp: &tempfile::TempDir) -> SaplensMcpServer {
        let corpus = tmp.path().join("sap");
        let onc = corpus.join("oncology");
        std::fs::create_dir_all(&onc).unwrap();
        std::fs::write(
            onc.join("lung.txt"),
            "Study Title: A Phase II study in non-small cell lung cancer\n\
             Sponsor: Acme Oncology\n",
        )
        .unwrap();
        std::fs::write(onc.join("blank.txt"), "").unwrap();

        SaplensMcpServer::new(SaplensState {
            config: EngineConfig::new(corpus).with_extensions(["txt"]),
            papers: PaperStore::new(tmp.path().join("papers")),
            provider: Box::new(DocumentText),
        })
    }

    fn text_of(result: &CallToolResult) -> String {
        result
            .content
            .first()
            .and_then(|c| c.as_text())
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn search_before_index_explains_what_to_do() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(&tmp);

        let result = server
            .find_studies(Parameters(FindParams {
                phase: None,
                therapeutic: None,
                indication: None,
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).starts_with("No search index found."));
    }

    #[tokio::test]
    async fn index_then_find_then_analyze() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(&tmp);

        let result = server.index_sap_documents().await.unwrap();
        assert_eq!(result.is_error, Some(false));
        assert!(
            text_of(&result)
                .starts_with("Indexing complete: 1 documents indexed, 1 errors.")
        );

        let result = server
            .find_studies(Parameters(FindParams {
                phase: Some("phase ii".to_string()),
                therapeutic: None,
                indication: Some("Lung Cancer".to_string()),
            }))
            .await
            .unwrap();
        let structured = result.structured_content.expect("structured");
        assert_eq!(structured["total_matches"], 1);
        assert_eq!(structured["search_criteria"]["therapeutic"], "Any");
        assert_eq!(
            structured["matching_studies"][0]["study_id"],
            "oncology_lung"
        );

        let result = server
            .search_primary_analysis(Parameters(StudyParams {
                study_id: "oncology_lung".to_string(),
            }))
            .await
            .unwrap();
        let structured = result.structured_content.expect("structured");
        assert_eq!(
            structured["study_identification"]["sponsor"],
            "Acme Oncology"
        );
        assert_eq!(
            structured["study_identification"]["detected_phase"],
            "Phase II"
        );
    }

    #[tokio::test]
    async fn unknown_study_is_a_tool_error() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(&tmp);
        server.index_sap_documents().await.unwrap();

        let result = server
            .search_primary_analysis(Parameters(StudyParams {
                study_id: "missing".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let text = text_of(&result);
        assert!(text.contains("Study ID 'missing' not found."));
        assert!(text.contains("oncology_lung"));
    }

    #[tokio::test]
    async fn parse_tool_reports_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(&tmp);
        let result = server
            .parse_for_index(Parameters(ParseParams {
                file_path: tmp.path().join("nope.pdf").display().to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).contains("not found"));
    }

    #[tokio::test]
    async fn paper_tools() {
        let tmp = tempfile::tempdir().unwrap();
        let server = server(&tmp);

        let listing = server.list_topics().await.unwrap();
        assert!(text_of(&listing).contains("No topics found."));

        server
            .state
            .papers
            .save(
                "clinical trials",
                [(
                    "2401.00001".to_string(),
                    PaperInfo {
                        title: "Adaptive Designs".to_string(),
                        authors: vec!["R. Author".to_string()],
                        summary: "A review.".to_string(),
                        pdf_url: "http://arxiv.org/pdf/2401.00001".to_string(),
                        published: "2024-01-02".to_string(),
                    },
                )],
            )
            .unwrap();

        let listing = server.list_topics().await.unwrap();
        assert!(text_of(&listing).contains("- clinical_trials"));

        let info = server
            .extract_info(Parameters(PaperParams {
                paper_id: "2401.00001".to_string(),
            }))
            .await
            .unwrap();
        let structured = info.structured_content.expect("structured");
        assert_eq!(structured["title"], "Adaptive Designs");

        let missing = server
            .extract_info(Parameters(PaperParams {
                paper_id: "0000".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(
            text_of(&missing),
            "There's no saved information related to paper 0000."
        );

        let topic = server
            .get_topic_papers(Parameters(TopicParams {
                topic: "clinical_trials".to_string(),
            }))
            .await
            .unwrap();
        assert!(text_of(&topic).starts_with("# Papers on Clinical Trials"));
    }
}
