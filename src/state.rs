use crate::config::settings::AppConfig;
use crate::infrastructure::queue::rabbitmq::RabbitMqService;
use crate::infrastructure::status::http::StatusClient;
use crate::infrastructure::storage::s3::StorageService;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub queue: RabbitMqService,
    pub storage: StorageService,
    pub status: StatusClient,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        queue: RabbitMqService,
        storage: StorageService,
        status: StatusClient,
    ) -> Self {
        Self {
            config,
            queue,
            storage,
            status,
        }
    }
}
