//! # 收敛曲线绘图
//!
//! 将离子步能量绘制为 PNG：TOTEN 折线、各步数据点、最低能量点高亮。
//!
//! ## 依赖关系
//! - 被 `commands/outcar.rs` 的 `profile` 命令使用
//! - 使用 `plotters` 的 BitMap 后端

use std::path::Path;

use vasplens::error::VaspError;
use vasplens::models::ConvergenceProfilePoint;
use vasplens::OpResult;

fn plot_error(e: impl std::fmt::Display) -> VaspError {
    VaspError::Other(format!("Failed to draw plot: {}", e))
}

/// 纵轴范围，单点或能量不变时给一个固定边距
fn y_range(points: &[ConvergenceProfilePoint]) -> (f64, f64) {
    let y_min = points
        .iter()
        .map(|p| p.total_energy_ev)
        .fold(f64::INFINITY, f64::min);
    let y_max = points
        .iter()
        .map(|p| p.total_energy_ev)
        .fold(f64::NEG_INFINITY, f64::max);

    let span = (y_max - y_min).abs();
    let margin = if span > 0.0 { span * 0.1 } else { 1e-3 };
    (y_min - margin, y_max + margin)
}

/// 生成收敛曲线 PNG
pub fn plot_convergence_profile(points: &[ConvergenceProfilePoint], output_path: &Path) -> OpResult<()> {
    use plotters::prelude::*;

    if points.is_empty() {
        return Err(VaspError::Other("No data to plot".to_string()).into());
    }

    let data: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (p.ionic_step as f64, p.total_energy_ev))
        .collect();
    let last_step = points.len() as f64;
    let (y_lo, y_hi) = y_range(points);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Ionic Convergence", ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(90)
        .build_cartesian_2d(0.5..(last_step + 0.5), y_lo..y_hi)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("Ionic step")
        .y_desc("TOTEN (eV)")
        .draw()
        .map_err(plot_error)?;

    // 连线
    chart
        .draw_series(LineSeries::new(data.iter().copied(), BLUE.stroke_width(2)))
        .map_err(plot_error)?
        .label("TOTEN")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    // 绘制数据点
    chart
        .draw_series(data.iter().map(|&(x, y)| Circle::new((x, y), 4, BLUE.filled())))
        .map_err(plot_error)?;

    // 标记最低点
    if let Some(&(min_x, min_y)) = data.iter().min_by(|a, b| a.1.total_cmp(&b.1)) {
        chart
            .draw_series(std::iter::once(Circle::new((min_x, min_y), 7, GREEN.filled())))
            .map_err(plot_error)?
            .label("Lowest energy")
            .legend(|(x, y)| Circle::new((x + 10, y), 5, GREEN.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(step: usize, energy: f64) -> ConvergenceProfilePoint {
        ConvergenceProfilePoint {
            ionic_step: step,
            total_energy_ev: energy,
            delta_energy_ev: None,
            relative_energy_ev: None,
        }
    }

    #[test]
    fn test_y_range_has_margin() {
        let (lo, hi) = y_range(&[point(1, -10.0), point(2, -11.0)]);
        assert!((lo - (-11.1)).abs() < 1e-9);
        assert!((hi - (-9.9)).abs() < 1e-9);
    }

    #[test]
    fn test_y_range_flat_series() {
        let (lo, hi) = y_range(&[point(1, -5.0)]);
        assert!(lo < -5.0 && hi > -5.0);
    }

    #[test]
    fn test_empty_profile_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = plot_convergence_profile(&[], &dir.path().join("p.png")).unwrap_err();
        assert_eq!(err.code, vasplens::ErrorCode::InternalError);
    }
}
