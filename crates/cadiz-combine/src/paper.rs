//! Per-signal paper portfolios.

use std::collections::BTreeMap;

use cadiz_optimize::{Constraint, MeanVarianceOptimizer, SolverSettings};
use cadiz_traits::{
    Alpha, AssetId, CadizError, Date, FactorDataAccess, Portfolio, Result, Universe,
    frame::{asset_values, date_values, f64_values, require_columns, str_values},
};
use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

/// Default risk aversion for paper portfolios.
pub const DEFAULT_PAPER_GAMMA: f64 = 2.0;

type Cross = Vec<(AssetId, f64)>;

/// Builds one optimized portfolio per `(signal, date)` from signal alphas.
///
/// Each portfolio maximizes the signal's alpha under a zero-beta constraint,
/// so its returns measure the signal rather than the market. Null alphas are
/// treated as zero, and the universe of a portfolio is the set of assets
/// with an alpha row on that date.
#[derive(Debug, Clone)]
pub struct PaperPortfolioBuilder {
    optimizer: MeanVarianceOptimizer,
    constraints: Vec<Constraint>,
    gamma: f64,
}

impl Default for PaperPortfolioBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PAPER_GAMMA)
    }
}

impl PaperPortfolioBuilder {
    /// Zero-beta paper portfolios with risk aversion `gamma`.
    pub fn new(gamma: f64) -> Self {
        Self {
            optimizer: MeanVarianceOptimizer::default(),
            constraints: vec![Constraint::ZeroBeta],
            gamma,
        }
    }

    /// Use the given solver settings.
    #[must_use]
    pub fn with_settings(mut self, settings: SolverSettings) -> Self {
        self.optimizer = MeanVarianceOptimizer::new(settings);
        self
    }

    /// Replace the zero-beta constraint with another set.
    #[must_use]
    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints = constraints;
        self
    }

    /// Risk aversion.
    pub const fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Constraints applied to every paper portfolio.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Optimize every `(signal, date)` cross-section of `alphas`.
    ///
    /// `alphas` needs `date, asset, name, alpha`. The output is
    /// `date, asset, signal, weight`, sorted by signal, date, and asset.
    /// Cross-sections are solved in parallel.
    ///
    /// # Errors
    ///
    /// Returns the first optimizer failure; a cross-section that cannot be
    /// solved is never filled with zero weights.
    pub fn build<D>(&self, source: &D, alphas: &DataFrame) -> Result<DataFrame>
    where
        D: FactorDataAccess + Sync,
    {
        let sections = cross_sections(alphas)?;
        let portfolios = sections
            .into_par_iter()
            .map(|((signal, date), rows)| {
                let portfolio = self.solve_one(source, date, rows).map_err(|e| {
                    debug!(%signal, %date, error = %e, "Paper portfolio failed");
                    e
                })?;
                Ok((signal, portfolio))
            })
            .collect::<Result<Vec<_>>>()?;

        let weights = to_frame(&portfolios)?;
        info!(
            portfolios = portfolios.len(),
            rows = weights.height(),
            "Paper portfolios built"
        );
        Ok(weights)
    }

    fn solve_one<D: FactorDataAccess>(&self, source: &D, date: Date, rows: Cross) -> Result<Portfolio> {
        let universe = Universe::new(rows.iter().map(|(asset, _)| asset.as_str()))?;
        if universe.len() != rows.len() {
            return Err(CadizError::InvalidData(format!(
                "duplicated assets in alphas on {date}"
            )));
        }
        let mut values = vec![0.0; universe.len()];
        for (asset, value) in rows {
            if let Some(i) = universe.position(&asset) {
                values[i] = value;
            }
        }
        let alpha = Alpha::new(date, universe, values.into())?;
        self.optimizer
            .optimize(source, &alpha, &self.constraints, self.gamma)
    }
}

/// Group alpha rows by `(signal, date)`; null alphas become zero.
fn cross_sections(alphas: &DataFrame) -> Result<Vec<((String, Date), Cross)>> {
    require_columns(alphas, &["date", "asset", "name", "alpha"])?;
    let dates = date_values(alphas, "date")?;
    let assets = asset_values(alphas, "asset")?;
    let names = str_values(alphas, "name")?;
    let values = f64_values(alphas, "alpha")?;

    let mut sections: BTreeMap<(String, Date), Cross> = BTreeMap::new();
    for (row, (((date, asset), name), value)) in
        dates.into_iter().zip(assets).zip(names).zip(values).enumerate()
    {
        let (Some(date), Some(name)) = (date, name) else {
            return Err(CadizError::InvalidData(format!(
                "null date or signal name in alphas at row {row}"
            )));
        };
        let value = value.filter(|v| v.is_finite()).unwrap_or(0.0);
        sections.entry((name, date)).or_default().push((asset, value));
    }
    Ok(sections.into_iter().collect())
}

fn to_frame(portfolios: &[(String, Portfolio)]) -> Result<DataFrame> {
    let rows: usize = portfolios.iter().map(|(_, p)| p.universe().len()).sum();
    let mut dates = Vec::with_capacity(rows);
    let mut assets = Vec::with_capacity(rows);
    let mut signals = Vec::with_capacity(rows);
    let mut weights = Vec::with_capacity(rows);
    for (signal, portfolio) in portfolios {
        for (asset, weight) in portfolio.universe().iter().zip(portfolio.weights()) {
            dates.push(portfolio.date());
            assets.push(asset.as_str());
            signals.push(signal.as_str());
            weights.push(*weight);
        }
    }
    Ok(df! {
        "date" => dates,
        "asset" => assets,
        "signal" => signals,
        "weight" => weights,
    }?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> Date {
        Date::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn test_cross_sections_group_and_fill() {
        let alphas = df! {
            "date" => &[date(3), date(3), date(3), date(4)],
            "asset" => &["B", "A", "A", "A"],
            "name" => &["momentum", "momentum", "beta", "momentum"],
            "alpha" => &[Some(1.0), None, Some(2.0), Some(f64::NAN)],
        }
        .unwrap();
        let sections = cross_sections(&alphas).unwrap();
        let keys: Vec<_> = sections.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(
            keys,
            vec![
                ("beta".to_string(), date(3)),
                ("momentum".to_string(), date(3)),
                ("momentum".to_string(), date(4)),
            ]
        );
        assert_eq!(
            sections[1].1,
            vec![("B".to_string(), 1.0), ("A".to_string(), 0.0)]
        );
        assert_eq!(sections[2].1, vec![("A".to_string(), 0.0)]);
    }

    #[test]
    fn test_missing_alpha_column() {
        let frame = df!("date" => &[date(3)], "asset" => &["A"], "name" => &["beta"]).unwrap();
        assert!(matches!(
            cross_sections(&frame),
            Err(CadizError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let builder = PaperPortfolioBuilder::default();
        assert_eq!(builder.gamma(), DEFAULT_PAPER_GAMMA);
        assert_eq!(builder.constraints(), &[Constraint::ZeroBeta]);
    }
}
