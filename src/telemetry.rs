use crate::error::TelemetryError;
use opentelemetry::global;
use opentelemetry_sdk::metrics::MeterProvider;
use tracing::info;

pub struct TelemetryConfig {
    pub enable_metrics: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
        }
    }
}

/// Owns the installed meter provider for the lifetime of the process.
pub struct TelemetryService {
    provider: Option<MeterProvider>,
}

impl TelemetryService {
    pub fn new(config: TelemetryConfig) -> Result<Self, TelemetryError> {
        if !config.enable_metrics {
            info!("Metrics collection disabled");
            return Ok(Self { provider: None });
        }

        let provider = MeterProvider::builder().build();
        global::set_meter_provider(provider.clone());
        Ok(Self {
            provider: Some(provider),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Flush and stop the meter provider.
    pub fn shutdown(self) -> Result<(), TelemetryError> {
        if let Some(provider) = self.provider {
            provider
                .shutdown()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        }
        Ok(())
    }
}

pub fn init_telemetry_with_config(config: TelemetryConfig) -> Result<TelemetryService, TelemetryError> {
    let service = TelemetryService::new(config)?;

    // Instruments must be created after the provider is installed.
    crate::metrics::Metrics::init();

    info!("OpenTelemetry telemetry initialized");
    Ok(service)
}
