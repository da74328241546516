//! PluginHost: an in-process `NativeBridge`.
//!
//! Requests are queued on an unbounded channel and executed on one worker
//! thread, so `invoke` never blocks the caller and completions always arrive
//! from the worker.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;

use tokio::sync::mpsc;

use super::{Plugin, PluginResult};
use crate::bridge::{ActionRequest, Completion, NativeBridge, PluginStatus};
use crate::config::HostConfig;
use crate::error::{log_bridge_error, BridgeError};

type Registry = Arc<RwLock<HashMap<String, Arc<dyn Plugin>>>>;

struct Job {
    request: ActionRequest,
    completion: Completion,
}

pub struct PluginHost {
    registry: Registry,
    jobs_tx: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PluginHost {
    /// Spawn the dispatch worker.
    pub fn new(config: &HostConfig) -> io::Result<Self> {
        let registry: Registry = Arc::new(RwLock::new(HashMap::new()));
        let (jobs_tx, mut jobs_rx) = mpsc::unbounded_channel::<Job>();

        let worker_registry = Arc::clone(&registry);
        let worker = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(err) => {
                        // Dropping the receiver fails every queued and future request.
                        tracing::error!("[PluginHost] Failed to build worker runtime: {}", err);
                        return;
                    }
                };

                rt.block_on(async move {
                    while let Some(job) = jobs_rx.recv().await {
                        Self::dispatch(&worker_registry, job);
                    }
                });
                tracing::debug!("[PluginHost] Worker exited");
            })?;

        Ok(Self {
            registry,
            jobs_tx: Mutex::new(Some(jobs_tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Register `plugin` under `name`, replacing any previous registration.
    pub fn register(&self, name: impl Into<String>, plugin: Arc<dyn Plugin>) {
        let name = name.into();
        match self.registry.write() {
            Ok(mut plugins) => {
                log::info!("[PluginHost] Registered plugin '{}'", name);
                plugins.insert(name, plugin);
            }
            Err(_) => log::error!("[PluginHost] Registry lock poisoned, '{}' not registered", name),
        }
    }

    /// Stop accepting requests and wait for queued ones to finish.
    pub fn shutdown(&self) {
        if let Ok(mut tx) = self.jobs_tx.lock() {
            tx.take();
        }
        let worker = self.worker.lock().ok().and_then(|mut guard| guard.take());
        if let Some(handle) = worker {
            if handle.join().is_err() {
                log::error!("[PluginHost] Worker panicked");
            }
        }
    }

    fn dispatch(registry: &Registry, job: Job) {
        let Job {
            request,
            completion,
        } = job;
        let span = tracing::debug_span!(
            "dispatch",
            plugin = %request.plugin_name,
            action = %request.action_name
        );
        let _enter = span.enter();

        let plugin = registry
            .read()
            .ok()
            .and_then(|plugins| plugins.get(&request.plugin_name).cloned());

        let result = match plugin {
            Some(plugin) => plugin.execute(request.action_name.as_str(), &request.args),
            None => PluginResult::class_not_found(&request.plugin_name),
        };

        tracing::debug!("[PluginHost] {} -> {:?}", request.action_name, result.status);
        Self::complete(completion, result);
    }

    fn complete(completion: Completion, result: PluginResult) {
        match result.status {
            PluginStatus::Ok => completion.succeed(result.message),
            status => {
                let err = BridgeError::NativeFailure {
                    status,
                    payload: result.message,
                };
                log_bridge_error(&err, "plugin_host");
                completion.fail(err);
            }
        }
    }
}

impl NativeBridge for PluginHost {
    fn invoke(&self, request: ActionRequest, completion: Completion) {
        let job = Job {
            request,
            completion,
        };

        let rejected = match self.jobs_tx.lock() {
            Ok(tx) => match tx.as_ref() {
                Some(tx) => tx.send(job).err().map(|mpsc::error::SendError(job)| job),
                None => Some(job),
            },
            Err(_) => Some(job),
        };

        if let Some(job) = rejected {
            job.completion
                .fail(BridgeError::native("plugin host is shut down"));
        }
    }
}

impl Drop for PluginHost {
    fn drop(&mut self) {
        self.shutdown();
    }
}
