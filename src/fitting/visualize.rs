use super::Dftb2Nnsk;
use crate::defaults::PLOT_SIZE;
use crate::error::{FitError, Result};
use crate::param::Element;
use crate::reference::Integral;
use log::info;
use ndarray::prelude::*;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::convert::TryFrom;
use std::path::{Path, PathBuf};

/// Label and index of a plotted integral channel.
type Channel = (usize, String);

impl Dftb2Nnsk {
    /// Plots the fitted (solid) and reference (dashed) integrals of the bond type
    /// `atom_a`-`atom_b` on `nsample` distances in `[r_min, r_max]`. Without a range the
    /// tabulated range of the bond type is used. The SVG file is written to `output`,
    /// or to `output/A-B.svg` if `output` is a directory. Returns the written path.
    pub fn visualize<P: AsRef<Path>>(
        &self,
        atom_a: &str,
        atom_b: Option<&str>,
        r_min: Option<f64>,
        r_max: Option<f64>,
        nsample: usize,
        output: P,
    ) -> Result<PathBuf> {
        let el_a: Element = Element::try_from(atom_a)?;
        let el_b: Element = Element::try_from(atom_b.unwrap_or(atom_a))?;
        let name: String = format!("{}-{}", el_a, el_b);
        let bond: usize = self.index().bond_index(&name)?;

        let (r_min, r_max) = match (r_min, r_max) {
            (Some(r_min), Some(r_max)) => (r_min, r_max),
            (None, None) => (
                self.reference.bond_r_min()[bond],
                self.reference.bond_r_max()[bond],
            ),
            _ => {
                return Err(FitError::config(
                    "r_min and r_max have to be given together",
                ))
            }
        };
        if !(r_min < r_max) || nsample < 2 {
            return Err(FitError::config(format!(
                "at least two distances in a non-empty range are needed, got {} in [{}, {}]",
                nsample, r_min, r_max
            )));
        }

        let distances: Array2<f64> = Array::linspace(r_min, r_max, nsample).insert_axis(Axis(0));
        let (hopping, overlap) = self.evaluate_step(distances.view(), &[bond])?;
        let hopping_ref = self
            .reference
            .evaluate_samples(distances.view(), &[bond], Integral::Hopping)?;
        let overlap_ref = self
            .reference
            .evaluate_samples(distances.view(), &[bond], Integral::Overlap)?;

        let idx = self.index();
        let (ia, ib) = idx.type_pair(bond);
        let mut channels: Vec<Channel> = Vec::new();
        for pair in idx.orbpairs().iter() {
            if let (Some(orb_a), Some(orb_b)) = (
                idx.element_orbital(ia, pair.iorb),
                idx.element_orbital(ib, pair.jorb),
            ) {
                for (m, channel) in pair.channels.clone().enumerate() {
                    channels.push((channel, format!("{}-{}-{}", orb_a, orb_b, m)));
                }
            }
        }

        let path: PathBuf = if output.as_ref().is_dir() {
            output.as_ref().join(format!("{}.svg", name))
        } else {
            output.as_ref().to_path_buf()
        };
        let r: Vec<f64> = distances.row(0).to_vec();
        {
            let root = SVGBackend::new(&path, PLOT_SIZE).into_drawing_area();
            root.fill(&WHITE).map_err(|err| FitError::Plot(err.to_string()))?;
            let (left, right) = root.split_horizontally((PLOT_SIZE.0 / 2) as i32);
            draw_panel(
                &left,
                &format!("{} hopping integrals / eV", name),
                &r,
                hopping.index_axis(Axis(0), 0),
                hopping_ref.index_axis(Axis(0), 0),
                &channels,
            )
            .map_err(|err| FitError::Plot(err.to_string()))?;
            draw_panel(
                &right,
                &format!("{} overlap integrals", name),
                &r,
                overlap.index_axis(Axis(0), 0),
                overlap_ref.index_axis(Axis(0), 0),
                &channels,
            )
            .map_err(|err| FitError::Plot(err.to_string()))?;
            root.present().map_err(|err| FitError::Plot(err.to_string()))?;
        }
        info!("integrals of {} plotted to {}", name, path.display());
        Ok(path)
    }
}

/// One chart with a solid line per fitted channel and a dashed line per reference channel.
fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    r: &[f64],
    fitted: ArrayView2<f64>,
    reference: ArrayView2<f64>,
    channels: &[Channel],
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let values = channels
        .iter()
        .flat_map(|(c, _)| fitted.column(*c).to_vec().into_iter().chain(reference.column(*c).to_vec()))
        .filter(|v| v.is_finite());
    let (y_min, y_max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let (y_min, y_max) = if y_min < y_max {
        let pad: f64 = 0.05 * (y_max - y_min);
        (y_min - pad, y_max + pad)
    } else if y_min.is_finite() {
        (y_min - 1.0, y_min + 1.0)
    } else {
        (-1.0, 1.0)
    };
    let x_range = r[0]..r[r.len() - 1];

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_min..y_max)?;
    chart
        .configure_mesh()
        .x_desc("r / A")
        .axis_desc_style(("sans-serif", 16))
        .draw()?;

    for (i, (c, label)) in channels.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(
                r.iter().copied().zip(fitted.column(*c).iter().copied()),
                color.stroke_width(2),
            ))?
            .label(label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        chart.draw_series(DashedLineSeries::new(
            r.iter().copied().zip(reference.column(*c).iter().copied()),
            6,
            4,
            color.stroke_width(1),
        ))?;
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::fitting::tests::engine;
    use std::env;
    use std::fs;

    #[test]
    fn svg_is_written() {
        let dir = env::temp_dir().join(format!("dftb2nnsk-plot-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let fit = engine(&["2s", "2p"]);
        let path = fit.visualize("b", Some("N"), Some(1.0), Some(5.0), 50, &dir).unwrap();
        assert_eq!(path, dir.join("B-N.svg"));
        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn invalid_requests_are_rejected() {
        let fit = engine(&["2s"]);
        let out = env::temp_dir().join("dftb2nnsk-never-written.svg");
        assert!(fit.visualize("C", None, Some(1.0), Some(2.0), 10, &out).is_err());
        assert!(fit.visualize("B", None, Some(1.0), None, 10, &out).is_err());
        assert!(fit.visualize("B", None, Some(2.0), Some(1.0), 10, &out).is_err());
    }
}
