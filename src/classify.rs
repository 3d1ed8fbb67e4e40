//! Funding-acknowledgment classification.
//!
//! The model sees one fixed instruction followed by the full article text and
//! must answer YES or NO. Replies are cached by the SHA-256 digest of the
//! text, so reprints of one article reached through different links cost a
//! single call.

use crate::api::{ChatModel, Throttle};
use crate::config::ServiceLimits;
use crate::models::Verdict;
use crate::utils::truncate_for_log;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

const INSTRUCTION: &str = "Answer YES or NO only. Does the following text acknowledge funding or support from \
the Directorate of Research Innovation and Consultancy (DRIC) of the University of Cape Coast? \
Look for phrases like 'Directorate of Research Innovation and Consultancy', or 'DRIC'.";

/// The fixed instruction followed by a blank line and `text`.
pub fn build_prompt(text: &str) -> String {
    format!("{INSTRUCTION}\n\n{text}")
}

/// `YES` only when the normalized reply starts with it.
pub fn parse_reply(reply: &str) -> Verdict {
    if reply.trim().to_uppercase().starts_with("YES") {
        Verdict::Yes
    } else {
        Verdict::No
    }
}

fn digest(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Language-model state for one run: the client, its call spacing, and the
/// digest-keyed verdict cache.
pub struct ClassifySession {
    model: Box<dyn ChatModel>,
    throttle: Throttle,
    cache: HashMap<String, Verdict>,
}

impl ClassifySession {
    pub fn new(model: Box<dyn ChatModel>, limits: ServiceLimits) -> Self {
        Self {
            model,
            throttle: Throttle::new("language-model", limits),
            cache: HashMap::new(),
        }
    }

    /// Ask whether `text` acknowledges DRIC funding.
    ///
    /// # Arguments
    ///
    /// * `text` - Full article text, embedded verbatim in the prompt
    ///
    /// # Returns
    ///
    /// [`Verdict::Yes`] only when the reply starts with YES. Empty text returns
    /// [`Verdict::No`] without a call; a failed or exhausted call also yields
    /// [`Verdict::No`], and is cached like any other answer.
    #[instrument(level = "info", skip_all, fields(chars = text.len()))]
    pub async fn classify(&mut self, text: &str) -> Verdict {
        if text.is_empty() {
            return Verdict::No;
        }

        let key = digest(text);
        if let Some(verdict) = self.cache.get(&key) {
            debug!(%verdict, "Classification cache hit");
            return *verdict;
        }

        let model = self.model.as_ref();
        let prompt = &build_prompt(text);
        let verdict = match self.throttle.run(move || model.ask(prompt)).await {
            Ok(reply) => {
                let verdict = parse_reply(&reply);
                info!(%verdict, reply = %truncate_for_log(reply.trim(), 40), "Model classified");
                verdict
            }
            Err(e) => {
                warn!(error = %e, "Defaulting to NO");
                Verdict::No
            }
        };

        self.cache.insert(key, verdict);
        verdict
    }
}
