use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{NnError, Result};
use crate::math::Matrix;
use crate::network::model::Model;
use crate::train::data::shuffle_dataset;
use crate::train::epoch_stats::EpochStats;
use crate::train::logger::TrainingLogger;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `model` for `config.epochs` epochs and returns the statistics of
/// every reporting epoch.
///
/// # Arguments
/// - `model`      — finalized model; its layers and optimizers are updated in place
/// - `x`, `y`     — training features and targets with matching row counts
/// - `validation` — optional `(features, targets)` evaluated on reporting epochs
/// - `config`     — epochs, batch size, reporting interval, shuffle seed
/// - `logger`     — receives progress lines and the failure message on error
///
/// # Errors
/// The first error from a forward, backward, update or evaluation step aborts
/// training; it is reported through `logger.error` and returned.
pub fn train_loop(
    model: &mut Model,
    x: &Matrix,
    y: &Matrix,
    validation: Option<(&Matrix, &Matrix)>,
    config: &TrainConfig,
    logger: &dyn TrainingLogger,
) -> Result<Vec<EpochStats>> {
    let checked = check_inputs(model, x, y, validation);
    reported(logger, "Invalid training input", checked)?;

    let validation = validation.filter(|(vx, _)| vx.rows > 0);
    let batch_size = if config.batch_size == 0 { x.rows } else { config.batch_size };
    let batch_steps = config.batch_steps(x.rows);
    let mut history = Vec::new();

    let mut shuffled: Option<(Matrix, Matrix)> = None;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    for epoch in 0..config.epochs {
        let t_start = Instant::now();

        // ── Optional reshuffle ─────────────────────────────────────────────
        if config.shuffle {
            let pair = shuffle_dataset(x, y, &mut rng);
            shuffled = Some(reported(logger, "Failed to shuffle dataset", pair)?);
        }
        let (epoch_x, epoch_y) = match &shuffled {
            Some((sx, sy)) => (sx, sy),
            None => (x, y),
        };

        // ── One full pass over the training data ───────────────────────────
        for step in 0..batch_steps {
            let start = step * batch_size;
            let end = (start + batch_size).min(x.rows);
            let batch = epoch_x
                .slice_rows(start, end)
                .and_then(|bx| Ok((bx, epoch_y.slice_rows(start, end)?)));
            let (batch_x, batch_y) = reported(logger, "Failed to slice batch", batch)?;
            reported(logger, "Failed to train batch", model.train_batch(&batch_x, &batch_y))?;
        }

        let elapsed_ms = t_start.elapsed().as_millis() as u64;

        if config.log_every == 0 || epoch % config.log_every != 0 {
            continue;
        }

        // ── Evaluation ────────────────────────────────────────────────────
        let train_loss = reported(logger, "Failed to calculate loss", model.calculate_loss(x, y))?;
        let train_accuracy =
            reported(logger, "Failed to calculate accuracy", model.calculate_accuracy(x, y))?;
        logger.info(&format!(
            "Epoch: {epoch}, Loss: {train_loss:.6}, Accuracy: {train_accuracy:.6}"
        ));

        let (val_loss, val_accuracy) = match validation {
            Some((vx, vy)) => {
                let loss = reported(
                    logger,
                    "Failed to calculate validation loss",
                    model.calculate_loss(vx, vy),
                )?;
                let accuracy = reported(
                    logger,
                    "Failed to calculate validation accuracy",
                    model.calculate_accuracy(vx, vy),
                )?;
                logger.info(&format!(
                    "Validation Loss: {loss:.6}, Validation Accuracy: {accuracy:.6}"
                ));
                (Some(loss), Some(accuracy))
            }
            None => (None, None),
        };

        history.push(EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            train_accuracy,
            val_loss,
            val_accuracy,
            elapsed_ms,
        });
    }

    Ok(history)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn check_inputs(
    model: &Model,
    x: &Matrix,
    y: &Matrix,
    validation: Option<(&Matrix, &Matrix)>,
) -> Result<()> {
    if !model.is_finalized() {
        return Err(NnError::NotFinalized);
    }
    if x.rows == 0 {
        return Err(NnError::Shape("training set is empty".into()));
    }
    if x.rows != y.rows {
        return Err(NnError::Shape(format!(
            "features have {} rows but targets have {}",
            x.rows, y.rows
        )));
    }
    if let Some((vx, vy)) = validation {
        if vx.rows != vy.rows {
            return Err(NnError::Shape(format!(
                "validation features have {} rows but targets have {}",
                vx.rows, vy.rows
            )));
        }
    }
    Ok(())
}

/// Logs `context: error` through the training logger before handing the
/// result back unchanged.
fn reported<T>(logger: &dyn TrainingLogger, context: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        logger.error(&format!("{context}: {e}"));
    }
    result
}
