use thiserror::Error;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SettingType {
    String,
    Int,
    Float,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    String(String),
    Int(isize),
    Float(f64),
}

impl SettingValue {
    pub fn value_type(&self) -> SettingType {
        match self {
            SettingValue::String(_) => SettingType::String,
            SettingValue::Int(_) => SettingType::Int,
            SettingValue::Float(_) => SettingType::Float,
        }
    }
}

pub type SettingRange = std::ops::Range<isize>;

#[derive(Debug, Error)]
pub enum SettingError {
    #[error("unknown setting \"{0}\"")]
    Unknown(String),
    #[error("setting \"{key}\" expects a value of type {expected:?}")]
    InvalidType { key: String, expected: SettingType },
    #[error("value for setting \"{0}\" is out of range")]
    OutOfRange(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    key: String,
    value: SettingValue,
    value_type: SettingType,
    pub range: SettingRange,
}

impl Setting {
    pub fn new<T: Into<String>>(key: T, value: SettingValue, range: Option<SettingRange>) -> Self {
        let value_type = value.value_type();
        let range = range.unwrap_or(isize::MIN..isize::MAX);

        Self {
            key: key.into(),
            value,
            value_type,
            range,
        }
    }

    /// Integer setting restricted to `0..2`.
    pub fn flag<T: Into<String>>(key: T, enabled: bool) -> Self {
        Self::new(key, SettingValue::Int(enabled as isize), Some(0..2))
    }

    pub fn key(&self) -> &String {
        &self.key
    }

    pub fn value(&self) -> &SettingValue {
        &self.value
    }

    pub fn value_type(&self) -> SettingType {
        self.value_type
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value {
            SettingValue::Int(i) => Some(i != 0),
            _ => None,
        }
    }

    /// Checks `value` against the type and range of this setting.
    pub fn validate(&self, value: &SettingValue) -> Result<(), SettingError> {
        if value.value_type() != self.value_type {
            return Err(SettingError::InvalidType {
                key: self.key.clone(),
                expected: self.value_type,
            });
        }

        let in_range = match value {
            SettingValue::String(s) => {
                (s.len() as isize) < self.range.end && (s.len() as isize) >= self.range.start
            }
            SettingValue::Int(i) => self.range.contains(i),
            SettingValue::Float(f) => *f < self.range.end as f64 && *f >= self.range.start as f64,
        };

        if in_range {
            Ok(())
        } else {
            Err(SettingError::OutOfRange(self.key.clone()))
        }
    }

    pub fn set(&mut self, value: SettingValue) -> Result<(), SettingError> {
        self.validate(&value)?;
        self.value = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_rejects_wrong_type_and_range() {
        let mut setting = Setting::flag("wireframe", true);
        assert_eq!(setting.as_bool(), Some(true));

        assert!(matches!(
            setting.set(SettingValue::Float(0.0)),
            Err(SettingError::InvalidType { .. })
        ));
        assert!(matches!(
            setting.set(SettingValue::Int(2)),
            Err(SettingError::OutOfRange(_))
        ));
        assert_eq!(setting.as_bool(), Some(true));

        setting.set(SettingValue::Int(0)).unwrap();
        assert_eq!(setting.as_bool(), Some(false));
    }
}
