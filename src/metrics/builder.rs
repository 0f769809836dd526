/// Helper struct to build Prometheus text exposition output
pub struct MetricBuilder {
    metrics: String,
}

impl MetricBuilder {
    pub fn new() -> Self {
        Self {
            metrics: String::new(),
        }
    }

    /// Add a HELP line
    pub fn help(&mut self, name: &str, description: &str) -> &mut Self {
        let description = description.replace('\\', "\\\\").replace('\n', "\\n");
        self.metrics
            .push_str(&format!("# HELP {name} {description}\n"));
        self
    }

    /// Add a TYPE line
    pub fn type_(&mut self, name: &str, metric_type: &str) -> &mut Self {
        self.metrics
            .push_str(&format!("# TYPE {name} {metric_type}\n"));
        self
    }

    /// Add a sample line with labels
    pub fn metric(&mut self, name: &str, labels: &[(&str, &str)], value: f64) -> &mut Self {
        self.metrics.push_str(name);

        if !labels.is_empty() {
            self.metrics.push('{');
            for (i, (key, value)) in labels.iter().enumerate() {
                if i > 0 {
                    self.metrics.push(',');
                }
                self.metrics
                    .push_str(&format!("{key}=\"{}\"", escape_label_value(value)));
            }
            self.metrics.push('}');
        }

        self.metrics.push(' ');
        self.metrics.push_str(&format_value(value));
        self.metrics.push('\n');
        self
    }

    /// Build the final metric string
    pub fn build(self) -> String {
        self.metrics
    }
}

impl Default for MetricBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Format a sample value the way Prometheus parses it.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "+Inf" } else { "-Inf" }.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_layout() {
        let mut builder = MetricBuilder::new();
        builder
            .help("nvidia_gpu_clock_mhz", "Current graphics clock in MHz")
            .type_("nvidia_gpu_clock_mhz", "gauge")
            .metric("nvidia_gpu_clock_mhz", &[("gpu", "0")], 1410.0)
            .metric("nvidia_gpu_clock_mhz", &[("gpu", "1")], 1395.5);

        assert_eq!(
            builder.build(),
            "# HELP nvidia_gpu_clock_mhz Current graphics clock in MHz\n\
             # TYPE nvidia_gpu_clock_mhz gauge\n\
             nvidia_gpu_clock_mhz{gpu=\"0\"} 1410\n\
             nvidia_gpu_clock_mhz{gpu=\"1\"} 1395.5\n"
        );
    }

    #[test]
    fn test_unlabeled_sample() {
        let mut builder = MetricBuilder::new();
        builder.metric("up", &[], 1.0);
        assert_eq!(builder.build(), "up 1\n");
    }

    #[test]
    fn test_label_escaping() {
        let mut builder = MetricBuilder::new();
        builder.metric("m", &[("a", "x\"y"), ("b", "c\\d")], 0.5);
        assert_eq!(builder.build(), "m{a=\"x\\\"y\",b=\"c\\\\d\"} 0.5\n");
    }

    #[test]
    fn test_special_values() {
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-Inf");
        assert_eq!(format_value(150.0), "150");
    }
}
