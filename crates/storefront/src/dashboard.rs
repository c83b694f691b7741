//! Sales analytics shown on the admin dashboard.
//!
//! The figures are static sample data; there is no order store behind them.
//! Charts are drawn as inline SVG by the template and the same series are
//! served as JSON for client-side charting.

use serde::Serialize;

/// Headline metric card.
#[derive(Debug, Clone, Serialize)]
pub struct Kpi {
    pub title: &'static str,
    pub value: &'static str,
    pub change: &'static str,
    pub icon: &'static str,
}

/// Revenue for one month, in euros.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MonthlySales {
    pub month: &'static str,
    pub total: u32,
}

/// Share of sales for one event category, in percent.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CategoryShare {
    pub name: &'static str,
    pub value: u32,
    pub color: &'static str,
}

/// Active users at a time of day.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrafficPoint {
    pub time: &'static str,
    pub users: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub kpis: Vec<Kpi>,
    pub sales: Vec<MonthlySales>,
    pub categories: Vec<CategoryShare>,
    pub traffic: Vec<TrafficPoint>,
}

const KPIS: [Kpi; 4] = [
    Kpi {
        title: "Ingresos Totales",
        value: "45.231,89€",
        change: "+20.1% respecto al mes pasado",
        icon: "dollar-sign",
    },
    Kpi {
        title: "Suscripciones",
        value: "+2350",
        change: "+180.1% respecto al mes pasado",
        icon: "users",
    },
    Kpi {
        title: "Ventas",
        value: "+12,234",
        change: "+19% respecto al mes pasado",
        icon: "credit-card",
    },
    Kpi {
        title: "Activos Ahora",
        value: "+573",
        change: "+201 desde la última hora",
        icon: "trending-up",
    },
];

const SALES: [(&str, u32); 12] = [
    ("Ene", 1500),
    ("Feb", 2300),
    ("Mar", 3200),
    ("Abr", 2800),
    ("May", 4500),
    ("Jun", 5100),
    ("Jul", 4800),
    ("Ago", 5600),
    ("Sep", 6200),
    ("Oct", 7500),
    ("Nov", 8100),
    ("Dic", 9200),
];

const CATEGORIES: [(&str, u32, &str); 4] = [
    ("Conciertos", 45, "#6366f1"),
    ("Teatro", 25, "#8b5cf6"),
    ("Deportes", 20, "#22d3ee"),
    ("Otros", 10, "#94a3b8"),
];

const TRAFFIC: [(&str, u32); 7] = [
    ("00:00", 120),
    ("04:00", 80),
    ("08:00", 450),
    ("12:00", 1200),
    ("16:00", 980),
    ("20:00", 1500),
    ("23:59", 600),
];

impl Dashboard {
    /// The dashboard's sample data set.
    #[must_use]
    pub fn sample() -> Self {
        Self {
            kpis: KPIS.to_vec(),
            sales: SALES
                .iter()
                .map(|&(month, total)| MonthlySales { month, total })
                .collect(),
            categories: CATEGORIES
                .iter()
                .map(|&(name, value, color)| CategoryShare { name, value, color })
                .collect(),
            traffic: TRAFFIC
                .iter()
                .map(|&(time, users)| TrafficPoint { time, users })
                .collect(),
        }
    }

    /// Sum of the monthly revenue series.
    #[must_use]
    pub fn annual_revenue(&self) -> u64 {
        self.sales.iter().map(|s| u64::from(s.total)).sum()
    }

    /// Best month by revenue.
    #[must_use]
    pub fn best_month(&self) -> Option<&MonthlySales> {
        self.sales.iter().max_by_key(|s| s.total)
    }

    /// Busiest time of day.
    #[must_use]
    pub fn peak_traffic(&self) -> Option<&TrafficPoint> {
        self.traffic.iter().max_by_key(|t| t.users)
    }

    /// Each category's share of the category total, in whole percent.
    #[must_use]
    pub fn category_percentages(&self) -> Vec<(&'static str, u32)> {
        let total: u32 = self.categories.iter().map(|c| c.value).sum();
        self.categories
            .iter()
            .map(|c| (c.name, percent(c.value, total)))
            .collect()
    }
}

fn percent(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let scaled = u64::from(part) * 100 / u64::from(total);
    u32::try_from(scaled).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_shapes() {
        let dashboard = Dashboard::sample();
        assert_eq!(dashboard.kpis.len(), 4);
        assert_eq!(dashboard.sales.len(), 12);
        assert_eq!(dashboard.categories.len(), 4);
        assert_eq!(dashboard.traffic.len(), 7);
    }

    #[test]
    fn test_derived_figures() {
        let dashboard = Dashboard::sample();
        assert_eq!(dashboard.annual_revenue(), 60_800);
        assert_eq!(dashboard.best_month().map(|s| s.month), Some("Dic"));
        assert_eq!(dashboard.peak_traffic().map(|t| t.time), Some("20:00"));
        assert_eq!(
            dashboard.category_percentages(),
            vec![("Conciertos", 45), ("Teatro", 25), ("Deportes", 20), ("Otros", 10)]
        );
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(Dashboard::sample()).unwrap_or_default();
        assert_eq!(json["sales"][0]["month"], "Ene");
        assert_eq!(json["categories"][0]["color"], "#6366f1");
        assert_eq!(json["traffic"][6]["users"], 600);
    }
}
