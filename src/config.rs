//! File-backed inputs for the console driver: the lot list, the balance
//! file, and the JSON-file ledger implementation.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use session::{LedgerError, LedgerService};
use types::{DurationMs, MemberSpend, Points, Provenance};

/// One lot entry in the lots file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotSpec {
    pub label: String,
    pub start_price: i64,
    /// Bidding window in seconds.
    pub duration_secs: u64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// "catalog" (default) or "manual".
    #[serde(default)]
    pub provenance: String,
}

fn default_quantity() -> u32 {
    1
}

impl LotSpec {
    pub fn provenance(&self) -> Provenance {
        if self.provenance.eq_ignore_ascii_case("manual") {
            Provenance::Manual
        } else {
            Provenance::Catalog
        }
    }

    pub fn duration_ms(&self) -> DurationMs {
        self.duration_secs * 1_000
    }
}

/// Load the lot list from a JSON file.
pub fn load_lots(path: &Path) -> Result<Vec<LotSpec>, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

/// The ledger as a pair of JSON files: balances in, session results out.
///
/// Stands in for the real balance/commit service so the engine can be
/// driven end to end from the console. Submission writes one results file
/// per session; a failed write surfaces as a ledger error and the result
/// set falls back to manual entry.
pub struct JsonLedger {
    balances_path: PathBuf,
    results_dir: PathBuf,
}

impl JsonLedger {
    pub fn new(balances_path: PathBuf, results_dir: PathBuf) -> Self {
        Self {
            balances_path,
            results_dir,
        }
    }
}

impl LedgerService for JsonLedger {
    fn fetch_balances(&self) -> Result<HashMap<String, Points>, LedgerError> {
        let text = fs::read_to_string(&self.balances_path)
            .map_err(|e| LedgerError::Unavailable(format!("{}: {}", self.balances_path.display(), e)))?;
        let raw: HashMap<String, i64> = serde_json::from_str(&text)
            .map_err(|e| LedgerError::Rejected(format!("balance file: {}", e)))?;
        Ok(raw.into_iter().map(|(name, pts)| (name, Points(pts))).collect())
    }

    fn submit_results(
        &self,
        results: &[MemberSpend],
        session_label: &str,
    ) -> Result<(), LedgerError> {
        let slug: String = session_label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let path = self.results_dir.join(format!("results-{}.json", slug));
        let json = serde_json::to_string_pretty(results)
            .map_err(|e| LedgerError::Rejected(e.to_string()))?;
        fs::write(&path, json)
            .map_err(|e| LedgerError::Unavailable(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lot_spec_defaults() {
        let spec: LotSpec = serde_json::from_str(
            r#"{"label": "Sword", "start_price": 100, "duration_secs": 120}"#,
        )
        .unwrap();
        assert_eq!(spec.quantity, 1);
        assert_eq!(spec.provenance(), Provenance::Catalog);
        assert_eq!(spec.duration_ms(), 120_000);
    }

    #[test]
    fn test_lot_spec_manual_provenance() {
        let spec: LotSpec = serde_json::from_str(
            r#"{"label": "Ring", "start_price": 50, "duration_secs": 60,
                "quantity": 3, "provenance": "Manual"}"#,
        )
        .unwrap();
        assert_eq!(spec.quantity, 3);
        assert_eq!(spec.provenance(), Provenance::Manual);
    }
}
