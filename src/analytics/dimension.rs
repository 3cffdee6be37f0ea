//! Grouping dimensions for aggregate reports

use super::filter::ReportFilter;

/// What a report produces one row per
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Region,
    Zone,
    Woreda,
    Group,
    /// A single row over the whole filtered set
    None,
}

impl Dimension {
    /// Location dimension implied by the filters: woreda > zone > region
    pub fn for_location(filter: &ReportFilter) -> Self {
        if filter.woreda.is_some() {
            Dimension::Woreda
        } else if filter.zone.is_some() {
            Dimension::Zone
        } else {
            Dimension::Region
        }
    }

    /// SQL expression of the bucket key over the `g` alias
    pub fn key_sql(&self) -> &'static str {
        match self {
            Dimension::Region => "g.region",
            Dimension::Zone => "g.zone",
            Dimension::Woreda => "g.woreda",
            Dimension::Group => "g.id",
            Dimension::None => "'all'",
        }
    }

    /// SQL expression of the human-readable bucket label
    pub fn label_sql(&self) -> &'static str {
        match self {
            Dimension::Group => "g.name",
            other => other.key_sql(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Region => "region",
            Dimension::Zone => "zone",
            Dimension::Woreda => "woreda",
            Dimension::Group => "group",
            Dimension::None => "none",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_precedence() {
        let cases = [
            (None, None, None, Dimension::Region),
            (Some("Oromia"), None, None, Dimension::Region),
            (Some("Oromia"), Some("East Shewa"), None, Dimension::Zone),
            (None, Some("East Shewa"), None, Dimension::Zone),
            (Some("Oromia"), Some("East Shewa"), Some("Adama"), Dimension::Woreda),
            (None, None, Some("Adama"), Dimension::Woreda),
            (Some("Oromia"), None, Some("Adama"), Dimension::Woreda),
        ];
        for (region, zone, woreda, expected) in cases {
            let mut filter = ReportFilter::all();
            filter.region = region.map(String::from);
            filter.zone = zone.map(String::from);
            filter.woreda = woreda.map(String::from);
            assert_eq!(Dimension::for_location(&filter), expected);
        }
    }

    #[test]
    fn test_group_dimension_labels_by_name() {
        assert_eq!(Dimension::Group.key_sql(), "g.id");
        assert_eq!(Dimension::Group.label_sql(), "g.name");
        assert_eq!(Dimension::Zone.label_sql(), "g.zone");
    }
}
