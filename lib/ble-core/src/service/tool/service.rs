use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use strum::IntoEnumIterator;

use super::ToolService;
use super::descriptor::describe;
use super::dto::{
    AdapterResponseDTO, AddressArgumentsDTO, ConnectionResponseDTO, NotificationResponseDTO,
    NotifyArgumentsDTO, ReadArgumentsDTO, ReadResponseDTO, ScanForArgumentsDTO,
    ScanResultResponseDTO, ServicesResponseDTO, ToolDescriptorDTO, ToolName,
};
use super::mapper::{duration_from_millis, notification_response, read_response};
use crate::bridge::run_blocking;
use crate::service::error::ServiceError;
use crate::service::session::BleSession;

impl ToolService {
    pub fn list_tools(&self) -> Vec<ToolDescriptorDTO> {
        ToolName::iter()
            .map(|tool| describe(tool, &self.defaults))
            .collect()
    }

    /// Dispatches a tool call by name and returns its JSON result.
    #[tracing::instrument(level = "debug", skip(self, arguments), err(Debug))]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ServiceError> {
        let tool =
            ToolName::from_str(name).map_err(|_| ServiceError::UnknownTool(name.to_owned()))?;

        match tool {
            ToolName::GetAdapters => to_value(self.get_adapters().await?),
            ToolName::ScanFor => to_value(self.scan_for(parse_arguments(arguments)?).await?),
            ToolName::Connect => {
                let AddressArgumentsDTO { address } = parse_arguments(arguments)?;
                to_value(self.connect(address).await?)
            }
            ToolName::Disconnect => {
                let AddressArgumentsDTO { address } = parse_arguments(arguments)?;
                to_value(self.disconnect(address).await?)
            }
            ToolName::Services => {
                let AddressArgumentsDTO { address } = parse_arguments(arguments)?;
                to_value(self.services(address).await?)
            }
            ToolName::Read => to_value(self.read(parse_arguments(arguments)?).await?),
            ToolName::Notify => to_value(self.notify(parse_arguments(arguments)?).await?),
        }
    }

    pub async fn get_adapters(&self) -> Result<Vec<AdapterResponseDTO>, ServiceError> {
        let adapters = self.blocking(|session| session.adapters()).await?;

        Ok(adapters.into_iter().map(Into::into).collect())
    }

    pub async fn scan_for(
        &self,
        request: ScanForArgumentsDTO,
    ) -> Result<Vec<ScanResultResponseDTO>, ServiceError> {
        let timeout = request
            .timeout_ms
            .map(duration_from_millis)
            .unwrap_or(self.defaults.default_scan_timeout);
        let adapter_index = request
            .adapter_index
            .unwrap_or(self.defaults.default_adapter_index);

        let results = self
            .blocking(move |session| session.scan(adapter_index, timeout))
            .await?;

        Ok(results.into_iter().map(Into::into).collect())
    }

    pub async fn connect(&self, address: String) -> Result<ConnectionResponseDTO, ServiceError> {
        let outcome = self
            .blocking(move |session| session.connect(&address))
            .await?;

        Ok(outcome.into())
    }

    pub async fn disconnect(&self, address: String) -> Result<ConnectionResponseDTO, ServiceError> {
        let outcome = self
            .blocking(move |session| session.disconnect(&address))
            .await?;

        Ok(outcome.into())
    }

    pub async fn services(&self, address: String) -> Result<ServicesResponseDTO, ServiceError> {
        let outcome = self
            .blocking(move |session| session.services(&address))
            .await?;

        Ok(outcome.into())
    }

    pub async fn read(&self, request: ReadArgumentsDTO) -> Result<ReadResponseDTO, ServiceError> {
        let ReadArgumentsDTO {
            address,
            service_uuid,
            char_uuid,
        } = request;

        let data = {
            let (service_uuid, char_uuid) = (service_uuid.clone(), char_uuid.clone());
            self.blocking(move |session| session.read(&address, &service_uuid, &char_uuid))
                .await?
        };

        Ok(read_response(service_uuid, char_uuid, &data))
    }

    /// Collects notifications for the requested window. A failed unsubscribe
    /// fails the call with the collected samples attached as partial result.
    pub async fn notify(
        &self,
        request: NotifyArgumentsDTO,
    ) -> Result<Vec<NotificationResponseDTO>, ServiceError> {
        let duration = request
            .duration_ms
            .map(duration_from_millis)
            .unwrap_or(self.defaults.default_notify_duration);

        let collection = {
            let request = request.clone();
            self.blocking(move |session| {
                session.notify_collect(
                    &request.address,
                    &request.service_uuid,
                    &request.char_uuid,
                    duration,
                )
            })
            .await?
        };

        let samples: Vec<NotificationResponseDTO> = collection
            .samples
            .iter()
            .map(|data| notification_response(&request.service_uuid, &request.char_uuid, data))
            .collect();

        match collection.unsubscribe_error {
            None => Ok(samples),
            Some(error) => Err(ServiceError::Incomplete {
                error: Box::new(error),
                partial_result: serde_json::to_value(samples)?,
            }),
        }
    }

    async fn blocking<T, F>(&self, task: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&BleSession) -> Result<T, ServiceError> + Send + 'static,
        T: Send + 'static,
    {
        let session = self.session.clone();
        run_blocking(move || task(&session)).await?
    }
}

fn parse_arguments<T: DeserializeOwned>(arguments: serde_json::Value) -> Result<T, ServiceError> {
    let arguments = match arguments {
        serde_json::Value::Null => serde_json::Value::Object(Default::default()),
        arguments => arguments,
    };

    serde_json::from_value(arguments).map_err(|err| ServiceError::InvalidArguments(err.to_string()))
}

fn to_value(response: impl Serialize) -> Result<serde_json::Value, ServiceError> {
    Ok(serde_json::to_value(response)?)
}
