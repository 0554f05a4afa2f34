//! Fans every logical operation out to all registered models.

use std::{fs, io, path::Path};

use comms::{DataFrame, Response};
use log::{debug, info, warn};
use ml_core::{Label, MlError};

use crate::{
    audit::{AuditLog, InferenceRecord, TrainingRecord},
    config::{Layout, Mode},
    error::{OrbitErr, Result},
    registry::{ModelState, Registry},
};

/// Drives the registered models for the process lifetime.
///
/// Owns the registry, the audit log and the latch telling whether the serialized
/// models were already loaded.
#[derive(Debug)]
pub struct ModelDispatcher {
    registry: Registry,
    audit: AuditLog,
    layout: Layout,
    log_training: bool,
    loaded: bool,
}

impl ModelDispatcher {
    /// Creates a new `ModelDispatcher`.
    ///
    /// # Args
    /// * `registry` - The enabled models.
    /// * `layout` - Where models and logs live.
    /// * `inputs` - The ordered input names, used as CSV columns.
    /// * `log_training` - Whether trained samples are appended to the training log.
    pub fn new(registry: Registry, layout: Layout, inputs: &[String], log_training: bool) -> Self {
        let audit = AuditLog::new(
            layout.training_log(),
            layout.inference_log(),
            inputs.iter().map(String::as_str),
            registry.names(),
        );

        Self {
            registry,
            audit,
            layout,
            log_training,
            loaded: false,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Whether the serialized models were already loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Applies `mode` to one data frame and returns the client's reply.
    ///
    /// # Errors
    /// Propagates any model or audit failure, the caller answers those with `ERROR`.
    pub fn handle(&mut self, mode: Mode, frame: &DataFrame) -> Result<Response> {
        match mode {
            Mode::TrainNew => {
                self.train_and_save(frame)?;
                Ok(Response::Ok)
            }
            Mode::TrainContinue => {
                self.ensure_loaded()?;
                self.train_and_save(frame)?;
                Ok(Response::Ok)
            }
            Mode::Infer => {
                self.ensure_loaded()?;
                let labels = self
                    .infer(frame)?
                    .into_iter()
                    .map(|(_, label)| label.as_i8())
                    .collect();

                Ok(Response::Predictions(labels))
            }
        }
    }

    /// Answers a `save` command under `mode`.
    ///
    /// Modes that continue from the serialized models load them first, so saving
    /// before the first data frame never overwrites them with untrained models.
    ///
    /// # Errors
    /// Returns `OrbitErr::Model` if a model can't be saved.
    pub fn save_in(&mut self, mode: Mode) -> Result<()> {
        if mode != Mode::TrainNew {
            self.ensure_loaded()?;
        }

        self.save()
    }

    /// Updates every model with `frame`, logging the sample if enabled.
    ///
    /// # Errors
    /// Returns `OrbitErr::Model` for the first model that rejects the sample.
    pub fn train(&mut self, frame: &DataFrame) -> Result<()> {
        let label = Label::from_sign(frame.target());

        for model in self.registry.iter_mut() {
            let name = model.name();
            model
                .instance_mut()
                .update(frame.features(), label)
                .map_err(|source| OrbitErr::Model { name, source })?;
        }

        if self.log_training {
            self.audit.append_training(&TrainingRecord::new(frame))?;
        }

        Ok(())
    }

    /// Trains on `frame`, then saves every model.
    ///
    /// # Errors
    /// Returns `OrbitErr::Model` if training or saving fails.
    pub fn train_and_save(&mut self, frame: &DataFrame) -> Result<()> {
        self.train(frame)?;
        self.save()
    }

    /// Predicts the class of `frame` with every model and logs the outcome.
    ///
    /// # Returns
    /// One `(name, label)` pair per model, in registry order.
    ///
    /// # Errors
    /// Returns `OrbitErr::Model` if a prediction fails and `OrbitErr::Io` if the
    /// inference log can't be written.
    pub fn infer(&self, frame: &DataFrame) -> Result<Vec<(&'static str, Label)>> {
        let predictions = self
            .registry
            .iter()
            .map(|model| {
                let name = model.name();
                model
                    .instance()
                    .predict(frame.features())
                    .map(|label| (name, label))
                    .map_err(|source| OrbitErr::Model { name, source })
            })
            .collect::<Result<Vec<_>>>()?;

        let labels = predictions.iter().map(|(_, label)| label.as_i8()).collect();
        self.audit
            .append_inference(&InferenceRecord::new(frame, labels))?;

        Ok(predictions)
    }

    /// Serializes every model into the models directory.
    ///
    /// # Errors
    /// Returns `OrbitErr::Model` for the first model that can't be saved.
    pub fn save(&self) -> Result<()> {
        for model in self.registry.iter() {
            let name = model.name();
            let path = self.layout.model_path(name);

            model
                .instance()
                .save(&path)
                .map_err(|source| OrbitErr::Model { name, source })?;
        }

        debug!("saved {} models", self.registry.len());
        Ok(())
    }

    /// Restores every model from the models directory.
    ///
    /// A model that can't be loaded starts over from scratch, the others are
    /// still loaded.
    ///
    /// # Errors
    /// Returns `OrbitErr::Model` only if a model can't be constructed again.
    pub fn load(&mut self) -> Result<()> {
        for model in self.registry.iter_mut() {
            let name = model.name();
            let path = self.layout.model_path(name);

            match model.instance_mut().load(&path) {
                Ok(()) => {
                    info!(model = name; "loaded serialized model");
                    model.set_state(ModelState::Loaded);
                }
                Err(e) => {
                    match &e {
                        MlError::ModelMissing(_) => {
                            warn!(model = name; "serialized model missing, starting from scratch")
                        }
                        _ => warn!(model = name; "failed to load model, starting from scratch: {e}"),
                    }

                    model
                        .reinit()
                        .map_err(|source| OrbitErr::Model { name, source })?;
                    model.set_state(ModelState::LoadFailed);
                }
            }
        }

        Ok(())
    }

    /// Loads the serialized models the first time it's called, later calls do nothing.
    ///
    /// # Errors
    /// See `load`.
    pub fn ensure_loaded(&mut self) -> Result<()> {
        if !self.loaded {
            self.load()?;
            self.loaded = true;
        }

        Ok(())
    }

    /// Forgets everything learned and logged so far.
    ///
    /// Removes every serialized model along with the training, inference and process
    /// logs. Every model goes back to a fresh state and the next data frame loads
    /// again.
    ///
    /// # Errors
    /// Returns `OrbitErr::Io` if a file exists but can't be removed.
    pub fn reset(&mut self) -> Result<()> {
        let models_dir = self.layout.models_dir();
        match fs::read_dir(&models_dir) {
            Ok(entries) => {
                for entry in entries {
                    let entry = entry.map_err(|e| OrbitErr::io(&models_dir, e))?;
                    let path = entry.path();
                    let is_file = entry
                        .file_type()
                        .map_err(|e| OrbitErr::io(&path, e))?
                        .is_file();

                    if is_file {
                        remove_if_exists(&path)?;
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(OrbitErr::io(models_dir, e)),
        }

        remove_if_exists(self.audit.training_path())?;
        remove_if_exists(self.audit.inference_path())?;
        remove_if_exists(&self.layout.process_log())?;

        for model in self.registry.iter_mut() {
            let name = model.name();
            model
                .reinit()
                .map_err(|source| OrbitErr::Model { name, source })?;
        }
        self.loaded = false;

        info!("reset models and logs");
        Ok(())
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(OrbitErr::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::registry::{AlgorithmKind, HyperValue, ModelSpec};

    fn dispatcher(dir: &TempDir, log_training: bool) -> ModelDispatcher {
        let layout = Layout::new(dir.path());
        layout.create_dirs().unwrap();

        let registry = Registry::from_specs([
            ModelSpec::new(AlgorithmKind::Arow, 2, vec![("r", HyperValue::Numeric(0.8))]),
            ModelSpec::new(
                AlgorithmKind::Pa,
                2,
                vec![("c", HyperValue::Numeric(1.0)), ("variant", HyperValue::Flag(1))],
            ),
        ])
        .unwrap();

        let inputs = vec!["PD1".to_string(), "PD2".to_string()];
        ModelDispatcher::new(registry, layout, &inputs, log_training)
    }

    fn frame(label: i8, features: [f64; 2]) -> DataFrame {
        DataFrame::new(label, features.to_vec()).unwrap()
    }

    fn train_positive(dispatcher: &mut ModelDispatcher) {
        for _ in 0..5 {
            dispatcher.train_and_save(&frame(1, [1.0, 1.0])).unwrap();
            dispatcher.train_and_save(&frame(-1, [-1.0, -1.0])).unwrap();
        }
    }

    #[test]
    fn train_new_saves_every_model() {
        let dir = TempDir::new().unwrap();
        let mut dispatcher = dispatcher(&dir, true);

        let response = dispatcher
            .handle(Mode::TrainNew, &frame(1, [0.5, 0.3]))
            .unwrap();
        assert_eq!(response, Response::Ok);

        assert!(dir.path().join("models/AROW").is_file());
        assert!(dir.path().join("models/PA").is_file());
        assert!(!dispatcher.is_loaded());

        let log = fs::read_to_string(dir.path().join("logs/training.csv")).unwrap();
        let lines: Vec<_> = log.lines().collect();
        assert_eq!(lines[0], "timestamp,target,PD1,PD2");
        assert!(lines[1].ends_with(",1,0.5,0.3"));
    }

    #[test]
    fn training_log_is_optional() {
        let dir = TempDir::new().unwrap();
        let mut dispatcher = dispatcher(&dir, false);

        dispatcher.train(&frame(1, [0.5, 0.3])).unwrap();
        assert!(!dir.path().join("logs/training.csv").exists());
    }

    #[test]
    fn infer_answers_in_registry_order() {
        let dir = TempDir::new().unwrap();
        let mut trainer = dispatcher(&dir, false);
        train_positive(&mut trainer);

        let mut inferer = dispatcher(&dir, false);
        let response = inferer.handle(Mode::Infer, &frame(0, [2.0, 2.0])).unwrap();
        assert_eq!(response, Response::Predictions(vec![1, 1]));
        assert!(inferer.is_loaded());
        assert!(
            inferer
                .registry()
                .iter()
                .all(|m| m.state() == ModelState::Loaded)
        );

        let log = fs::read_to_string(dir.path().join("logs/inference.csv")).unwrap();
        let lines: Vec<_> = log.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "timestamp,target,PD1,PD2,AROW,PA");
        assert!(lines[1].ends_with(",-1,2,2,1,1"));
    }

    #[test]
    fn missing_model_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut trainer = dispatcher(&dir, false);
        train_positive(&mut trainer);
        fs::remove_file(dir.path().join("models/PA")).unwrap();

        let mut inferer = dispatcher(&dir, false);
        inferer.ensure_loaded().unwrap();

        let arow = inferer.registry().get("AROW").unwrap();
        let pa = inferer.registry().get("PA").unwrap();
        assert_eq!(arow.state(), ModelState::Loaded);
        assert_eq!(pa.state(), ModelState::LoadFailed);
        assert_eq!(pa.instance().predict(&[2.0, 2.0]).unwrap(), Label::Negative);
        assert_eq!(arow.instance().predict(&[2.0, 2.0]).unwrap(), Label::Positive);
    }

    #[test]
    fn models_are_loaded_once() {
        let dir = TempDir::new().unwrap();
        let mut dispatcher = dispatcher(&dir, false);

        dispatcher
            .handle(Mode::TrainContinue, &frame(1, [1.0, 1.0]))
            .unwrap();
        assert!(dispatcher.is_loaded());

        train_positive(&mut dispatcher);
        fs::write(dir.path().join("models/AROW"), "not a model").unwrap();
        dispatcher.ensure_loaded().unwrap();

        let arow = dispatcher.registry().get("AROW").unwrap();
        assert_eq!(arow.state(), ModelState::LoadFailed);
        assert_eq!(arow.instance().predict(&[2.0, 2.0]).unwrap(), Label::Positive);
    }

    #[test]
    fn reset_then_load_starts_from_scratch() {
        let dir = TempDir::new().unwrap();
        let mut dispatcher = dispatcher(&dir, true);
        train_positive(&mut dispatcher);
        dispatcher.infer(&frame(1, [1.0, 1.0])).unwrap();
        fs::write(dir.path().join("logs/orbitai.log"), "[0][INFO] hi\n").unwrap();
        fs::create_dir(dir.path().join("models/keep")).unwrap();

        dispatcher.reset().unwrap();
        assert!(!dir.path().join("models/AROW").exists());
        assert!(!dir.path().join("models/PA").exists());
        assert!(dir.path().join("models/keep").is_dir());
        assert!(!dir.path().join("logs/training.csv").exists());
        assert!(!dir.path().join("logs/inference.csv").exists());
        assert!(!dir.path().join("logs/orbitai.log").exists());
        assert!(!dispatcher.is_loaded());

        dispatcher.ensure_loaded().unwrap();
        for model in dispatcher.registry().iter() {
            assert_eq!(model.state(), ModelState::LoadFailed);
            assert_eq!(model.instance().predict(&[2.0, 2.0]).unwrap(), Label::Negative);
        }
        assert!(!dir.path().join("logs/training.csv").exists());
        assert!(!dir.path().join("logs/inference.csv").exists());
    }

    #[test]
    fn early_save_keeps_trained_models() {
        let dir = TempDir::new().unwrap();
        let mut trainer = dispatcher(&dir, false);
        train_positive(&mut trainer);

        for mode in [Mode::TrainContinue, Mode::Infer] {
            let mut fresh = dispatcher(&dir, false);
            fresh.save_in(mode).unwrap();
            assert!(fresh.is_loaded());

            let mut reloaded = dispatcher(&dir, false);
            reloaded.ensure_loaded().unwrap();
            for model in reloaded.registry().iter() {
                assert_eq!(model.state(), ModelState::Loaded);
                assert_eq!(
                    model.instance().predict(&[2.0, 2.0]).unwrap(),
                    Label::Positive,
                    "{mode:?} {}",
                    model.name()
                );
            }
        }

        let mut fresh = dispatcher(&dir, false);
        fresh.save_in(Mode::TrainNew).unwrap();
        assert!(!fresh.is_loaded());
    }

    #[test]
    fn reset_without_files_succeeds() {
        let dir = TempDir::new().unwrap();
        let mut dispatcher = dispatcher(&dir, true);

        dispatcher.reset().unwrap();
        dispatcher.reset().unwrap();
    }

    #[test]
    fn wrong_dimension_is_a_model_error() {
        let dir = TempDir::new().unwrap();
        let mut dispatcher = dispatcher(&dir, false);

        let frame = DataFrame::new(1, vec![1.0, 2.0, 3.0]).unwrap();
        let err = dispatcher.handle(Mode::TrainNew, &frame).unwrap_err();
        assert!(matches!(err, OrbitErr::Model { name: "AROW", .. }));
    }
}
