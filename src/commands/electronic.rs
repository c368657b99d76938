//! # 电子结构子命令实现
//!
//! ## 功能
//! - electronic: 带隙（分自旋通道）与 DOS 元数据
//! - dos: 费米能级附近的总 DOS 曲线
//!
//! ## 依赖关系
//! - 使用 `cli/electronic.rs` 定义的参数
//! - 使用库中的 `operations/electronic.rs`, `utils/output.rs`

use super::{print_json, read_input};
use crate::cli::electronic::{DosArgs, ElectronicArgs};

use tabled::{Table, Tabled};

use vasplens::models::{BandGapChannel, BandGapResult, DosMetadata};
use vasplens::operations;
use vasplens::utils::output::{self, fmt_opt};
use vasplens::OpResult;

/// 自旋通道表格行
#[derive(Debug, Clone, Tabled)]
struct ChannelRow {
    #[tabled(rename = "Spin")]
    spin: String,
    #[tabled(rename = "VBM (eV)")]
    vbm: String,
    #[tabled(rename = "CBM (eV)")]
    cbm: String,
    #[tabled(rename = "Gap (eV)")]
    gap: String,
    #[tabled(rename = "k(VBM)")]
    k_vbm: String,
    #[tabled(rename = "k(CBM)")]
    k_cbm: String,
    #[tabled(rename = "Type")]
    kind: String,
}

fn gap_kind(is_metal: bool, is_direct: Option<bool>) -> &'static str {
    match (is_metal, is_direct) {
        (true, _) => "metal",
        (false, Some(true)) => "direct",
        (false, Some(false)) => "indirect",
        (false, None) => "-",
    }
}

fn fmt_index(index: Option<usize>) -> String {
    index.map_or("-".to_string(), |k| k.to_string())
}

impl From<&BandGapChannel> for ChannelRow {
    fn from(c: &BandGapChannel) -> Self {
        ChannelRow {
            spin: c.spin.clone(),
            vbm: fmt_opt(c.vbm_ev, 4),
            cbm: fmt_opt(c.cbm_ev, 4),
            gap: fmt_opt(c.gap_ev, 4),
            k_vbm: fmt_index(c.kpoint_index_vbm),
            k_cbm: fmt_index(c.kpoint_index_cbm),
            kind: gap_kind(c.is_metal, c.is_direct).to_string(),
        }
    }
}

/// DOS 曲线表格行
#[derive(Debug, Clone, Tabled)]
struct DosRow {
    #[tabled(rename = "Index")]
    index: usize,
    #[tabled(rename = "E (eV)")]
    energy: String,
    #[tabled(rename = "E - Ef (eV)")]
    relative: String,
    #[tabled(rename = "DOS")]
    dos: String,
}

fn print_band_gap(gap: &BandGapResult) {
    output::print_header("Band Gap (EIGENVAL)");
    output::print_field("Electrons", gap.electron_count);
    output::print_field("k-points", gap.kpoint_count);
    output::print_field("Bands", gap.band_count);
    output::print_field("Spin polarized", gap.is_spin_polarized);
    output::print_field("Fundamental gap (eV)", fmt_opt(gap.fundamental_gap_ev, 4));
    output::print_field("Character", gap_kind(gap.is_metal, gap.is_direct));
    println!();

    let rows: Vec<ChannelRow> = gap.channels.iter().map(ChannelRow::from).collect();
    println!("{}", Table::new(&rows));
}

fn print_dos_metadata(meta: &DosMetadata) {
    output::print_header("DOS (DOSCAR)");
    output::print_field(
        "Energy range (eV)",
        format!("{:.4} .. {:.4}", meta.energy_min_ev, meta.energy_max_ev),
    );
    output::print_field("NEDOS", meta.nedos);
    output::print_field("E-fermi (eV)", format!("{:.4}", meta.efermi_ev));
    output::print_field("Energy step (eV)", fmt_opt(meta.energy_step_ev, 4));
    output::print_field("DOS at E-fermi", format!("{:.4}", meta.total_dos_at_fermi));
    output::print_field("Spin polarized", meta.is_spin_polarized);
    output::print_field("Integrated DOS", meta.has_integrated_dos);
    output::print_field("Partial DOS", meta.has_partial_dos);
}

/// electronic
pub fn electronic(args: ElectronicArgs, json: bool) -> OpResult<()> {
    let band_text = args
        .eigenval
        .as_deref()
        .map(|p| read_input(p, "eigenval_path", "EIGENVAL"))
        .transpose()?;
    let dos_text = args
        .doscar
        .as_deref()
        .map(|p| read_input(p, "doscar_path", "DOSCAR"))
        .transpose()?;

    let metadata =
        operations::parse_electronic_metadata(band_text.as_deref(), dos_text.as_deref())?;

    if json {
        return print_json(&metadata);
    }

    if let Some(gap) = &metadata.band_gap {
        print_band_gap(gap);
    }
    if let Some(meta) = &metadata.dos_metadata {
        print_dos_metadata(meta);
    }
    output::print_warnings(&metadata.warnings);
    Ok(())
}

/// dos
pub fn dos(args: DosArgs, json: bool) -> OpResult<()> {
    let text = read_input(&args.doscar, "doscar_path", "DOSCAR")?;
    let profile = operations::build_dos_profile(&text, args.window, args.max_points)?;

    if json {
        return print_json(&profile);
    }

    output::print_header(&format!(
        "Total DOS within ±{} eV of E-fermi = {:.4} eV",
        profile.energy_window_ev, profile.efermi_ev
    ));
    let rows: Vec<DosRow> = profile
        .points
        .iter()
        .map(|p| DosRow {
            index: p.index,
            energy: format!("{:.4}", p.energy_ev),
            relative: format!("{:+.4}", p.energy_relative_ev),
            dos: format!("{:.4}", p.dos_total),
        })
        .collect();
    println!("{}", Table::new(&rows));
    output::print_warnings(&profile.warnings);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_kind() {
        assert_eq!(gap_kind(true, Some(true)), "metal");
        assert_eq!(gap_kind(false, Some(false)), "indirect");
        assert_eq!(gap_kind(false, None), "-");
    }
}
