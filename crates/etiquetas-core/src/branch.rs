//! Branch (filial) configuration.
//!
//! The three store branches are static configuration: loaded at process
//! start, never persisted. Each branch has its own stats webhook and its
//! own cache namespace, so one branch's data can never shadow another's.

/// One physical store branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Branch {
    /// Stable identifier used in cache keys and webhook paths.
    pub id: &'static str,
    /// Display name.
    pub nome: &'static str,
    /// Path of the stats webhook under the webhook base URL.
    webhook: &'static str,
}

/// The known branches. Exactly these three exist.
pub const FILIAIS: [Branch; 3] = [
    Branch {
        id: "sobral",
        nome: "Sobral",
        webhook: "dashboard-etiquetas-sobral",
    },
    Branch {
        id: "maracanau",
        nome: "Maracanau",
        webhook: "dashboard-etiquetas-maracanau",
    },
    Branch {
        id: "caucaia",
        nome: "Caucaia",
        webhook: "dashboard-etiquetas-caucaia",
    },
];

impl Branch {
    pub fn all() -> &'static [Branch] {
        &FILIAIS
    }

    /// Look a branch up by its identifier, case-insensitively.
    pub fn by_id(id: &str) -> Option<&'static Branch> {
        let id = id.trim();
        FILIAIS.iter().find(|f| f.id.eq_ignore_ascii_case(id))
    }

    /// URL of this branch's labeling stats webhook.
    pub fn stats_url(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.webhook)
    }

    /// URL of this branch's unlabeled items webhook.
    pub fn unlabeled_url(&self, base: &str) -> String {
        format!("{}/items-sem-etiqueta/{}", base.trim_end_matches('/'), self.id)
    }
}
