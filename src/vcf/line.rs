use thiserror::Error;

/// Errors raised while reading a VCF data line.
#[derive(Debug, Error, PartialEq)]
pub enum VcfError {
    /// Fewer than the eight mandatory columns.
    #[error("VCF lines must have at least 8 fields, found {0}")]
    TooFewFields(usize),

    /// A FORMAT column without any sample column.
    #[error("FORMAT column present without sample columns")]
    FormatWithoutSamples,

    /// Sample names were supplied but do not match the sample columns.
    #[error("expected {expected} samples from the provided names, found {found}")]
    SampleCountMismatch {
        /// Number of names supplied.
        expected: usize,
        /// Number of sample columns on the line.
        found: usize,
    },

    /// A sample has more values than FORMAT has keys.
    #[error("sample '{sample}' has {values} values but FORMAT '{format}' has {keys} keys")]
    TooManySampleValues {
        /// Sample name.
        sample: String,
        /// FORMAT column.
        format: String,
        /// Number of FORMAT keys.
        keys: usize,
        /// Number of sample values.
        values: usize,
    },

    /// POS is not a non-negative integer.
    #[error("invalid position '{0}'")]
    InvalidPosition(String),
}

/// Values of one sample column, keyed by FORMAT key in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SampleValues(Vec<(String, String)>);

impl SampleValues {
    /// Value for a FORMAT key; keys without a value map to `""`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// `(key, value)` pairs in FORMAT order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One parsed VCF data line.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VcfLine {
    pub chrom: String,
    pub pos: u64,
    /// `None` for `.`.
    pub id: Option<String>,
    pub reference: String,
    pub alt: String,
    /// Unparseable or missing values read as `0.0`.
    pub qual: f64,
    /// `None` for `.`.
    pub filter: Option<String>,
    /// `None` for `.`; flag keys carry no value.
    pub info: Option<Vec<(String, Option<String>)>>,
    pub format: Option<String>,
    /// Samples in column order, named `1..n` unless names were supplied.
    pub samples: Vec<(String, SampleValues)>,
}

impl VcfLine {
    /// Parse one data line. Header lines (`#...`) yield `Ok(None)`.
    pub fn parse(line: &str, sample_names: Option<&[&str]>) -> Result<Option<Self>, VcfError> {
        if line.starts_with('#') {
            return Ok(None);
        }

        let f: Vec<&str> = line.trim_end_matches(['\n', '\r']).split('\t').collect();
        if f.len() < 8 {
            return Err(VcfError::TooFewFields(f.len()));
        }

        let dot_none = |s: &str| (s != ".").then(|| s.to_string());
        let info = dot_none(f[7]).map(|raw| {
            raw.split(';')
                .map(|entry| match entry.split_once('=') {
                    Some((key, value)) if !value.contains('=') => {
                        (key.to_string(), Some(value.to_string()))
                    }
                    _ => (entry.to_string(), None),
                })
                .collect()
        });

        let mut record = VcfLine {
            chrom: f[0].to_string(),
            pos: f[1]
                .parse()
                .map_err(|_| VcfError::InvalidPosition(f[1].to_string()))?,
            id: dot_none(f[2]),
            reference: f[3].to_string(),
            alt: f[4].to_string(),
            qual: f[5].parse().unwrap_or(0.0),
            filter: dot_none(f[6]),
            info,
            format: None,
            samples: Vec::new(),
        };

        match f.len() {
            8 => return Ok(Some(record)),
            9 => return Err(VcfError::FormatWithoutSamples),
            _ => {}
        }

        let format = f[8];
        let keys: Vec<&str> = format.split(':').collect();
        let columns = &f[9..];

        let names: Vec<String> = match sample_names {
            None => (1..=columns.len()).map(|i| i.to_string()).collect(),
            Some(names) if names.len() == columns.len() => {
                names.iter().map(|n| n.to_string()).collect()
            }
            Some(names) => {
                return Err(VcfError::SampleCountMismatch {
                    expected: names.len(),
                    found: columns.len(),
                })
            }
        };

        for (name, column) in names.into_iter().zip(columns) {
            let values: Vec<&str> = column.split(':').collect();
            if values.len() > keys.len() {
                return Err(VcfError::TooManySampleValues {
                    sample: name,
                    format: format.to_string(),
                    keys: keys.len(),
                    values: values.len(),
                });
            }
            let pairs = keys
                .iter()
                .enumerate()
                .map(|(i, key)| {
                    let value = values.get(i).copied().unwrap_or("");
                    (key.to_string(), value.to_string())
                })
                .collect();
            record.samples.push((name, SampleValues(pairs)));
        }
        record.format = Some(format.to_string());

        Ok(Some(record))
    }

    /// INFO value for `key`; `Some(None)` for a flag.
    pub fn info_value(&self, key: &str) -> Option<Option<&str>> {
        self.info
            .as_ref()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    /// Values of the named sample.
    pub fn sample(&self, name: &str) -> Option<&SampleValues> {
        self.samples.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "19\t111\t.\tA\tC\t9.6\t.\t.\tGT:HQ\t0|0:10,10\t0|0:10,10\t0/1:3,3";
    const INFO_LINE: &str =
        "20\t14370\trs6054257\tG\tA\t29\t0\tNS=3;DP=14;AF=0.5;DB;H2\tGT:GQ:DP:HQ\t0|0:48:1:51,51\t1|0:48:8:51,51\t1/1:43:5:.,.";

    #[test]
    fn parses_mandatory_columns() {
        let vcf = VcfLine::parse(LINE, None).unwrap().unwrap();
        assert_eq!(vcf.chrom, "19");
        assert_eq!(vcf.pos, 111);
        assert_eq!(vcf.id, None);
        assert_eq!(vcf.reference, "A");
        assert_eq!(vcf.alt, "C");
        assert_eq!(vcf.qual, 9.6);
        assert_eq!(vcf.filter, None);
        assert_eq!(vcf.info, None);
        assert_eq!(vcf.format.as_deref(), Some("GT:HQ"));
    }

    #[test]
    fn samples_are_numbered_by_default() {
        let vcf = VcfLine::parse(LINE, None).unwrap().unwrap();
        assert_eq!(vcf.samples.len(), 3);
        assert_eq!(vcf.sample("1").unwrap().get("GT"), Some("0|0"));
        assert_eq!(vcf.sample("3").unwrap().get("HQ"), Some("3,3"));
    }

    #[test]
    fn info_flags_have_no_value() {
        let vcf = VcfLine::parse(INFO_LINE, None).unwrap().unwrap();
        assert_eq!(vcf.id.as_deref(), Some("rs6054257"));
        assert_eq!(vcf.filter.as_deref(), Some("0"));
        assert_eq!(vcf.info_value("DP"), Some(Some("14")));
        assert_eq!(vcf.info_value("DB"), Some(None));
        assert_eq!(vcf.info_value("missing"), None);
    }

    #[test]
    fn named_samples() {
        let vcf = VcfLine::parse(INFO_LINE, Some(&["a", "b", "c"][..])).unwrap().unwrap();
        assert_eq!(vcf.sample("b").unwrap().get("DP"), Some("8"));
        assert_eq!(
            VcfLine::parse(INFO_LINE, Some(&["a", "b"][..])),
            Err(VcfError::SampleCountMismatch {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn short_sample_values_pad_with_empty() {
        let vcf = VcfLine::parse("1\t5\t.\tA\tT\t10\t.\t.\tGT:GQ:DP\t0/1", None)
            .unwrap()
            .unwrap();
        let sample = vcf.sample("1").unwrap();
        assert_eq!(sample.get("GT"), Some("0/1"));
        assert_eq!(sample.get("DP"), Some(""));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(
            VcfLine::parse("1\t5\t.\tA", None),
            Err(VcfError::TooFewFields(4))
        );
        assert_eq!(
            VcfLine::parse("1\t5\t.\tA\tT\t10\t.\t.\tGT", None),
            Err(VcfError::FormatWithoutSamples)
        );
        assert!(matches!(
            VcfLine::parse("1\t5\t.\tA\tT\t10\t.\t.\tGT\t0/1:9", None),
            Err(VcfError::TooManySampleValues { keys: 1, values: 2, .. })
        ));
        assert_eq!(
            VcfLine::parse("1\tfive\t.\tA\tT\t10\t.\t.", None),
            Err(VcfError::InvalidPosition("five".to_string()))
        );
    }

    #[test]
    fn header_lines_are_skipped() {
        assert_eq!(VcfLine::parse("#CHROM\tPOS", None), Ok(None));
    }
}
