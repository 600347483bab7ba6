use crate::error::Result;
use tracing::{debug, info};

use super::r#trait::InputListenerTrait;

/// Слушатель сухого режима: устройства не открываются, события не поступают
pub struct DryRunListener {
    kind: &'static str,
}

impl DryRunListener {
    pub fn new(kind: &'static str) -> Self {
        info!("Инициализация DryRunListener ({})", kind);
        Self { kind }
    }

    async fn run_impl(self) -> Result<()> {
        info!("Dry-run режим - слушатель {} работает в режиме эмуляции", self.kind);

        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
            debug!("Слушатель {} работает в dry-run режиме", self.kind);
        }
    }
}

#[async_trait::async_trait]
impl InputListenerTrait for DryRunListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
