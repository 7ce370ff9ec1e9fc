//! Spoken answers.
//!
//! Every message the assistant can say without consulting the model lives
//! here, along with the formatting of analytics answers.

use rally_core::{StatStore, Timestamp};

use crate::error::VoiceError;

/// Confirmation after the activation keyword.
pub const MIC_ACTIVATED: &str = "Micrófono activado";
/// Point-duration question asked before any point was recorded.
pub const NO_POINT_DATA: &str = "Aún no hay datos de puntos.";
/// Serve-speed question asked before any serve was detected.
pub const NO_SERVES: &str = "No se han detectado saques todavía.";
/// The proxy could not be reached or answered with a failure.
pub const MODEL_ERROR: &str = "Error al contactar el modelo.";
/// The proxy answered successfully but without an answer.
pub const EMPTY_RESPONSE: &str = "El modelo no devolvió ninguna respuesta.";

/// Average point duration, one decimal place.
pub fn point_duration(stats: &StatStore, now: Timestamp) -> String {
    match stats.average_point_duration_secs(now) {
        Some(avg) => format!("La duración promedio de los puntos es {avg:.1} segundos."),
        None => NO_POINT_DATA.to_string(),
    }
}

/// Fastest serve of the session.
pub fn serve_speed(stats: &StatStore, _now: Timestamp) -> String {
    match stats.max_serve_speed() {
        Some(max) => format!("La velocidad máxima de saque registrada es {max} km/h."),
        None => NO_SERVES.to_string(),
    }
}

/// Turn the outcome of a proxy call into something to say.
pub fn from_remote(result: Result<Option<String>, VoiceError>) -> String {
    match result {
        Ok(Some(answer)) => answer,
        Ok(None) => EMPTY_RESPONSE.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Model proxy call failed");
            MODEL_ERROR.to_string()
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
