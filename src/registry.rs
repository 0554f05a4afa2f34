//! The fixed catalog of online algorithms and the registry built from it.

use std::fmt;

use log::info;
use ml_core::{AdagradRda, Adam, Arow, MlError, Nherd, OnlineClassifier, Pa, PaVariant, Scw};

use crate::config::{ConfigErr, ConfigSource};

/// Every online algorithm the controller knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmKind {
    AdagradRda,
    Adam,
    Arow,
    Nherd,
    Pa,
    Scw,
}

/// The type a hyperparameter value is read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Numeric,
    Flag,
}

/// A named hyperparameter an algorithm needs at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HyperParam {
    pub name: &'static str,
    pub ty: ParamType,
}

const fn numeric(name: &'static str) -> HyperParam {
    HyperParam {
        name,
        ty: ParamType::Numeric,
    }
}

const fn flag(name: &'static str) -> HyperParam {
    HyperParam {
        name,
        ty: ParamType::Flag,
    }
}

impl AlgorithmKind {
    /// The whole catalog in registry order.
    pub const ALL: [AlgorithmKind; 6] = [
        AlgorithmKind::AdagradRda,
        AlgorithmKind::Adam,
        AlgorithmKind::Arow,
        AlgorithmKind::Nherd,
        AlgorithmKind::Pa,
        AlgorithmKind::Scw,
    ];

    /// The canonical name, used as enable flag key, model file name and log column.
    pub fn name(self) -> &'static str {
        match self {
            AlgorithmKind::AdagradRda => "ADAGRAD_RDA",
            AlgorithmKind::Adam => "ADAM",
            AlgorithmKind::Arow => "AROW",
            AlgorithmKind::Nherd => "NHERD",
            AlgorithmKind::Pa => "PA",
            AlgorithmKind::Scw => "SCW",
        }
    }

    /// The hyperparameters the algorithm requires, in construction order.
    pub fn hyper_params(self) -> &'static [HyperParam] {
        const ADAGRAD_RDA: &[HyperParam] = &[numeric("eta"), numeric("lambda")];
        const AROW: &[HyperParam] = &[numeric("r")];
        const NHERD: &[HyperParam] = &[numeric("c"), flag("diagonal")];
        const PA: &[HyperParam] = &[numeric("c"), flag("variant")];
        const SCW: &[HyperParam] = &[numeric("c"), numeric("eta")];

        match self {
            AlgorithmKind::AdagradRda => ADAGRAD_RDA,
            AlgorithmKind::Adam => &[],
            AlgorithmKind::Arow => AROW,
            AlgorithmKind::Nherd => NHERD,
            AlgorithmKind::Pa => PA,
            AlgorithmKind::Scw => SCW,
        }
    }

    /// The configuration key holding the value of hyperparameter `param`.
    pub fn hparam_key(self, param: &str) -> String {
        format!("{}.hparam.{param}", self.name())
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A hyperparameter value as read from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HyperValue {
    Numeric(f64),
    Flag(i64),
}

/// Everything needed to construct a fresh model of one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    kind: AlgorithmKind,
    dim: usize,
    hparams: Vec<(&'static str, HyperValue)>,
}

impl ModelSpec {
    pub fn new(kind: AlgorithmKind, dim: usize, hparams: Vec<(&'static str, HyperValue)>) -> Self {
        Self { kind, dim, hparams }
    }

    pub fn kind(&self) -> AlgorithmKind {
        self.kind
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns the configured value of the hyperparameter `name`.
    pub fn hparam(&self, name: &str) -> Option<HyperValue> {
        self.hparams
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| *value)
    }

    pub fn hparams(&self) -> &[(&'static str, HyperValue)] {
        &self.hparams
    }

    /// Constructs a fresh, untrained model.
    ///
    /// # Errors
    /// Returns `MlError::InvalidHyperParam` if a hyperparameter is missing, has
    /// the wrong type or is out of the algorithm's domain.
    pub fn instantiate(&self) -> Result<Box<dyn OnlineClassifier>, MlError> {
        let dim = self.dim;

        let model: Box<dyn OnlineClassifier> = match self.kind {
            AlgorithmKind::AdagradRda => Box::new(AdagradRda::new(
                dim,
                self.numeric("eta")?,
                self.numeric("lambda")?,
            )?),
            AlgorithmKind::Adam => Box::new(Adam::new(dim)),
            AlgorithmKind::Arow => Box::new(Arow::new(dim, self.numeric("r")?)?),
            AlgorithmKind::Nherd => Box::new(Nherd::new(
                dim,
                self.numeric("c")?,
                self.flag("diagonal")?,
            )?),
            AlgorithmKind::Pa => {
                let variant = PaVariant::try_from(self.flag("variant")?)?;
                Box::new(Pa::new(dim, self.numeric("c")?, variant)?)
            }
            AlgorithmKind::Scw => Box::new(Scw::new(
                dim,
                self.numeric("c")?,
                self.numeric("eta")?,
            )?),
        };

        Ok(model)
    }

    fn numeric(&self, name: &'static str) -> Result<f64, MlError> {
        match self.hparam(name) {
            Some(HyperValue::Numeric(value)) => Ok(value),
            _ => Err(MlError::InvalidHyperParam {
                name,
                reason: "expected a numeric value",
            }),
        }
    }

    fn flag(&self, name: &'static str) -> Result<i64, MlError> {
        match self.hparam(name) {
            Some(HyperValue::Flag(value)) => Ok(value),
            _ => Err(MlError::InvalidHyperParam {
                name,
                reason: "expected an integer flag",
            }),
        }
    }
}

/// Where a model's state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// Freshly constructed, nothing was loaded yet.
    NotLoaded,
    /// Restored from its serialized file.
    Loaded,
    /// Loading was attempted and failed, the model started from scratch.
    LoadFailed,
}

/// One registered model, owned by the registry for the process lifetime.
pub struct ModelHandle {
    spec: ModelSpec,
    instance: Box<dyn OnlineClassifier>,
    state: ModelState,
}

impl ModelHandle {
    fn new(spec: ModelSpec) -> Result<Self, MlError> {
        let instance = spec.instantiate()?;
        Ok(Self {
            spec,
            instance,
            state: ModelState::NotLoaded,
        })
    }

    pub fn name(&self) -> &'static str {
        self.spec.kind.name()
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ModelState) {
        self.state = state;
    }

    pub fn instance(&self) -> &dyn OnlineClassifier {
        self.instance.as_ref()
    }

    pub fn instance_mut(&mut self) -> &mut dyn OnlineClassifier {
        self.instance.as_mut()
    }

    /// Drops all learned state, leaving a freshly constructed model.
    pub(crate) fn reinit(&mut self) -> Result<(), MlError> {
        self.instance = self.spec.instantiate()?;
        self.state = ModelState::NotLoaded;
        Ok(())
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("spec", &self.spec)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// The ordered set of enabled models.
///
/// Membership is fixed once built, only the models' inner state changes.
#[derive(Debug, Default)]
pub struct Registry {
    models: Vec<ModelHandle>,
}

impl Registry {
    /// Builds a registry with every algorithm enabled in `src`.
    ///
    /// An algorithm is enabled when the integer under its canonical name equals 1.
    /// Its hyperparameters are then read from `<name>.hparam.<param>`.
    ///
    /// # Args
    /// * `dim` - The feature dimension every model is bound to.
    /// * `src` - The configuration to read flags and hyperparameters from.
    ///
    /// # Errors
    /// Returns `ConfigErr::Missing` if an enabled algorithm lacks a hyperparameter and
    /// `ConfigErr::Invalid` if a value doesn't parse or is rejected by the algorithm.
    pub fn build<S: ConfigSource>(dim: usize, src: &S) -> Result<Self, ConfigErr> {
        let mut models = Vec::new();

        for kind in AlgorithmKind::ALL {
            if src.parse::<i64>(kind.name())? != Some(1) {
                continue;
            }

            let spec = read_spec(kind, dim, src)?;
            let handle = ModelHandle::new(spec).map_err(|e| invalid_hparam(kind, src, e))?;

            info!("enabled algorithm {kind} with {:?}", handle.spec().hparams());
            models.push(handle);
        }

        Ok(Self { models })
    }

    /// Builds a registry out of already constructed specs, in the given order.
    ///
    /// # Errors
    /// Returns `MlError::InvalidHyperParam` if a spec can't be instantiated.
    pub fn from_specs<I: IntoIterator<Item = ModelSpec>>(specs: I) -> Result<Self, MlError> {
        let models = specs
            .into_iter()
            .map(ModelHandle::new)
            .collect::<Result<_, _>>()?;

        Ok(Self { models })
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelHandle> {
        self.models.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ModelHandle> {
        self.models.iter_mut()
    }

    /// The model names in registry order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.models.iter().map(ModelHandle::name)
    }

    pub fn get(&self, name: &str) -> Option<&ModelHandle> {
        self.models.iter().find(|m| m.name() == name)
    }
}

fn read_spec<S: ConfigSource>(kind: AlgorithmKind, dim: usize, src: &S) -> Result<ModelSpec, ConfigErr> {
    let hparams = kind
        .hyper_params()
        .iter()
        .map(|param| {
            let key = kind.hparam_key(param.name);
            let value = match param.ty {
                ParamType::Numeric => HyperValue::Numeric(src.require(&key)?),
                ParamType::Flag => HyperValue::Flag(src.require(&key)?),
            };

            Ok((param.name, value))
        })
        .collect::<Result<_, ConfigErr>>()?;

    Ok(ModelSpec::new(kind, dim, hparams))
}

fn invalid_hparam<S: ConfigSource>(kind: AlgorithmKind, src: &S, e: MlError) -> ConfigErr {
    let (key, reason) = match e {
        MlError::InvalidHyperParam { name, reason } => (kind.hparam_key(name), reason),
        _ => (kind.name().to_string(), "model construction failed"),
    };

    ConfigErr::Invalid {
        value: src.get(&key).unwrap_or_default().to_string(),
        key,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn builds_only_enabled_algorithms() {
        let src = source(&[
            ("AROW", "1"),
            ("AROW.hparam.r", "0.8"),
            ("SCW", "1"),
            ("SCW.hparam.c", "1.0"),
            ("SCW.hparam.eta", "0.95"),
            ("PA", "0"),
            ("PA.hparam.c", "1.0"),
            ("PA.hparam.variant", "1"),
            ("NHERD.hparam.c", "0.5"),
        ]);

        let registry = Registry::build(3, &src).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), ["AROW", "SCW"]);

        let arow = registry.get("AROW").unwrap();
        assert_eq!(arow.spec().hparam("r"), Some(HyperValue::Numeric(0.8)));
        assert_eq!(arow.instance().dim(), 3);
        assert_eq!(arow.state(), ModelState::NotLoaded);

        let scw = registry.get("SCW").unwrap();
        assert_eq!(
            scw.spec().hparams(),
            &[("c", HyperValue::Numeric(1.0)), ("eta", HyperValue::Numeric(0.95))]
        );

        assert!(registry.get("PA").is_none());
        assert!(registry.get("NHERD").is_none());
    }

    #[test]
    fn registry_follows_catalog_order() {
        let src = source(&[
            ("SCW", "1"),
            ("SCW.hparam.c", "1"),
            ("SCW.hparam.eta", "0.9"),
            ("ADAM", "1"),
            ("PA", "1"),
            ("PA.hparam.c", "0.5"),
            ("PA.hparam.variant", "2"),
            ("NHERD", "1"),
            ("NHERD.hparam.c", "0.5"),
            ("NHERD.hparam.diagonal", "1"),
            ("ADAGRAD_RDA", "1"),
            ("ADAGRAD_RDA.hparam.eta", "0.1"),
            ("ADAGRAD_RDA.hparam.lambda", "0.0001"),
            ("AROW", "1"),
            ("AROW.hparam.r", "0.1"),
        ]);

        let registry = Registry::build(2, &src).unwrap();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            ["ADAGRAD_RDA", "ADAM", "AROW", "NHERD", "PA", "SCW"]
        );

        let nherd = registry.get("NHERD").unwrap();
        assert_eq!(nherd.spec().hparam("diagonal"), Some(HyperValue::Flag(1)));
    }

    #[test]
    fn missing_hyperparameter_fails() {
        let src = source(&[("SCW", "1"), ("SCW.hparam.c", "1.0")]);

        let err = Registry::build(3, &src).unwrap_err();
        assert!(matches!(err, ConfigErr::Missing(key) if key == "SCW.hparam.eta"));
    }

    #[test]
    fn flag_must_be_an_integer() {
        let src = source(&[("PA", "1"), ("PA.hparam.c", "1"), ("PA.hparam.variant", "1.5")]);

        let err = Registry::build(3, &src).unwrap_err();
        assert!(matches!(err, ConfigErr::Invalid { key, .. } if key == "PA.hparam.variant"));
    }

    #[test]
    fn out_of_domain_hyperparameter_fails() {
        let src = source(&[("AROW", "1"), ("AROW.hparam.r", "-2")]);

        let err = Registry::build(3, &src).unwrap_err();
        assert!(matches!(
            err,
            ConfigErr::Invalid { key, value, .. } if key == "AROW.hparam.r" && value == "-2"
        ));
    }

    #[test]
    fn nothing_enabled_yields_an_empty_registry() {
        let registry = Registry::build(3, &source(&[])).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn reinit_forgets_training() {
        let spec = ModelSpec::new(AlgorithmKind::Arow, 1, vec![("r", HyperValue::Numeric(0.1))]);
        let mut registry = Registry::from_specs([spec]).unwrap();
        let handle = registry.iter_mut().next().unwrap();

        for _ in 0..10 {
            handle
                .instance_mut()
                .update(&[1.0], ml_core::Label::Positive)
                .unwrap();
        }
        assert_eq!(handle.instance().predict(&[1.0]).unwrap(), ml_core::Label::Positive);

        handle.set_state(ModelState::Loaded);
        handle.reinit().unwrap();
        assert_eq!(handle.instance().predict(&[1.0]).unwrap(), ml_core::Label::Negative);
        assert_eq!(handle.state(), ModelState::NotLoaded);
    }
}
