//! `zkport assess` — build a transfer plan and print its report.

use anyhow::{bail, Context, Result};
use zkport_platforms::Catalog;
use zkport_transfer::{assess, Report, TransferConfig, TransferRequest};

pub fn run(
    catalog: &Catalog,
    request: &TransferRequest,
    config: &TransferConfig,
    format: &str,
) -> Result<()> {
    let assessment = assess(catalog, request, config).context("assessing transfer")?;
    println!("{}", render(&assessment.report, format)?);
    Ok(())
}

/// Render a report as `text` or `json`.
pub fn render(report: &Report, format: &str) -> Result<String> {
    match format {
        "text" => Ok(report.to_string()),
        "json" => serde_json::to_string_pretty(report).context("serializing report"),
        other => bail!("unknown report format '{other}' (expected text or json)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkport_platforms::PlatformId;

    const GUEST: &str = "sp1_zkvm::entrypoint!(main);\npub fn main() {\n    let n = sp1_zkvm::io::read::<u32>();\n    sp1_zkvm::io::commit(&n);\n}\n";
    const HOST: &str = "fn main() {\n    let mut stdin = sp1_sdk::SP1Stdin::new();\n    stdin.write(&5u32);\n}\n";

    fn report() -> Report {
        let request = TransferRequest {
            source: PlatformId::Sp1,
            target: PlatformId::Risc0,
            guest: GUEST.to_string(),
            host: HOST.to_string(),
        };
        assess(&Catalog::builtin().unwrap(), &request, &TransferConfig::default())
            .unwrap()
            .report
    }

    #[test]
    fn json_report_carries_totals() {
        let json = render(&report(), "json").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"], "sp1");
        assert_eq!(value["target"], "risc0");
        assert_eq!(value["totals"]["total"], 5);
    }

    #[test]
    fn text_report_has_status() {
        let text = render(&report(), "text").unwrap();
        assert!(text.contains("Status: READY"));
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(render(&report(), "yaml").is_err());
    }
}
