use crate::{
    camera::MediaSources,
    config::Config,
    pipeline::CapturePipeline,
    server::{AppCamera, HttpServer},
};
use coin_classifier::{InferenceEngine, ModelLoader, OnnxArtifact};
use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

fn camera_device(config: &Config) -> AppCamera {
    #[cfg(feature = "camera-opencv")]
    {
        AppCamera::new(&config.camera)
    }
    #[cfg(not(feature = "camera-opencv"))]
    {
        let _ = config;
        AppCamera::default()
    }
}

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let loader = ModelLoader::new(OnnxArtifact::new(&config.model));
    let media = MediaSources::new(camera_device(&config));

    // Neither failure is fatal; /health reports both states.
    let (model_result, camera_result) = tokio::join!(
        loader.load(),
        media.start_camera(config.camera.facing_mode)
    );
    if let Err(e) = model_result {
        tracing::error!("Failed to load the model: {}", e);
    }
    if let Err(e) = camera_result {
        tracing::error!("Failed to start the camera: {}", e);
    }

    let pipeline = Arc::new(CapturePipeline::new(
        media,
        InferenceEngine::new(loader.handle()),
    ));

    let server = HttpServer::new(pipeline.clone(), &config).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_handle = server.run(shutdown_tx.subscribe()).await;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    match server_handle.await {
        Ok(Err(e)) => tracing::error!("Server stopped with error: {}", e),
        Err(e) => tracing::error!("Server task failed: {}", e),
        Ok(Ok(())) => {}
    }
    pipeline.media().stop_camera().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
