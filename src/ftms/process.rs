use super::detect::{HeuristicDetector, DEFAULT_LONG_FORM_MIN_WORDS};
use super::extract::{within_scan_limit, DEFAULT_MAX_SCAN_BYTES};
use super::markers::extract_hidden_files;
use super::schema::{ProcessOptions, ProcessedResponse};
use crate::config::FtmsConfig;

/// Post-processes assistant responses into chat text plus file candidates.
///
/// Hidden markers always take precedence: when any marker matched, the
/// heuristic detector is not consulted at all.
#[derive(Debug, Clone)]
pub struct ResponseProcessor {
    detector: HeuristicDetector,
    max_scan_bytes: usize,
}

impl Default for ResponseProcessor {
    fn default() -> Self {
        Self {
            detector: HeuristicDetector::new(DEFAULT_LONG_FORM_MIN_WORDS),
            max_scan_bytes: DEFAULT_MAX_SCAN_BYTES,
        }
    }
}

impl ResponseProcessor {
    pub fn from_config(config: &FtmsConfig) -> Self {
        Self {
            detector: HeuristicDetector::new(config.long_form_min_words),
            max_scan_bytes: config.max_scan_bytes,
        }
    }

    pub fn process(
        &self,
        response: &str,
        user_message: Option<&str>,
        options: ProcessOptions,
    ) -> ProcessedResponse {
        let user_message = user_message.unwrap_or_default();

        if !within_scan_limit(response, self.max_scan_bytes) {
            tracing::warn!(
                bytes = response.len(),
                limit = self.max_scan_bytes,
                "Response exceeds scan limit, skipping file extraction"
            );
            return ProcessedResponse {
                clean_response: response.to_string(),
                files: Vec::new(),
            };
        }

        let extraction = extract_hidden_files(response, user_message);
        if !extraction.files.is_empty() {
            return ProcessedResponse {
                clean_response: extraction.clean_response,
                files: extraction.files,
            };
        }

        let files = if options.skip_heuristics {
            Vec::new()
        } else {
            self.detector
                .detect(response, user_message)
                .into_iter()
                .collect()
        };

        ProcessedResponse {
            clean_response: response.to_string(),
            files,
        }
    }
}

/// Process one response with default limits.
pub fn process_response(
    response: &str,
    user_message: Option<&str>,
    options: ProcessOptions,
) -> ProcessedResponse {
    ResponseProcessor::default().process(response, user_message, options)
}
