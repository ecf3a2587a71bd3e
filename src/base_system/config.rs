//! 配置文件读写：首次运行生成带注释的 yml，之后把用户值合并到默认值之上。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid yaml at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMeta {
    pub name: &'static str,
    pub description: &'static str,
}

/// 可落盘的配置类型：文件名 + 每个字段的注释。
pub trait ConfigSpec: Serialize + DeserializeOwned + Default {
    const FILE_NAME: &'static str;
    fn fields() -> &'static [FieldMeta];
}

/// 路径规则：显式路径优先；否则 `base_dir/FILE_NAME`；都没有则当前目录。
pub fn load_or_create<T: ConfigSpec>(
    config_path: Option<&Path>,
    base_dir: Option<&Path>,
) -> Result<T, ConfigError> {
    let path = match (config_path, base_dir) {
        (Some(p), _) => p.to_path_buf(),
        (None, Some(base)) => base.join(T::FILE_NAME),
        (None, None) => PathBuf::from(T::FILE_NAME),
    };

    if !path.exists() {
        let config = T::default();
        write_with_comments(&config, &path)?;
        info!("已生成默认配置: {}", path.display());
        return Ok(config);
    }

    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let user: Value = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    let missing = missing_fields::<T>(&user);

    let mut merged = serde_yaml::to_value(T::default()).map_err(validation)?;
    merge_values(&mut merged, user);
    let config: T = serde_yaml::from_value(merged).map_err(validation)?;

    if !missing.is_empty() {
        debug!("配置缺少字段 {:?}，补全后重写", missing);
        write_with_comments(&config, &path)?;
    }
    Ok(config)
}

pub fn write_with_comments<T: ConfigSpec>(config: &T, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let yaml = render_with_comments(config)?;
    fs::write(path, yaml).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// 按 `fields()` 的顺序输出，每个字段上方带一行注释。
pub fn render_with_comments<T: ConfigSpec>(config: &T) -> Result<String, ConfigError> {
    let Value::Mapping(mapping) = serde_yaml::to_value(config).map_err(validation)? else {
        return Err(ConfigError::Validation(
            "config must serialize to a mapping".to_string(),
        ));
    };

    let mut out = String::new();
    for field in T::fields() {
        if !field.description.is_empty() {
            for line in field.description.lines() {
                out.push_str("# ");
                out.push_str(line);
                out.push('\n');
            }
        }
        let key = Value::String(field.name.to_string());
        let val = mapping.get(&key).cloned().unwrap_or(Value::Null);
        let entry = serde_yaml::to_string(&Mapping::from_iter([(key, val)])).map_err(validation)?;
        out.push_str(entry.trim_end());
        out.push('\n');
    }
    Ok(out)
}

fn missing_fields<T: ConfigSpec>(user: &Value) -> Vec<&'static str> {
    let Value::Mapping(map) = user else {
        return T::fields().iter().map(|f| f.name).collect();
    };
    T::fields()
        .iter()
        .filter(|f| !map.contains_key(Value::String(f.name.to_string())))
        .map(|f| f.name)
        .collect()
}

fn merge_values(default: &mut Value, user: Value) {
    match (default, user) {
        (Value::Mapping(dest), Value::Mapping(src)) => {
            for (key, user_val) in src {
                match dest.get_mut(&key) {
                    Some(dest_val) => merge_values(dest_val, user_val),
                    None => {
                        dest.insert(key, user_val);
                    }
                }
            }
        }
        // 空文件解析出来是 null，保留默认值
        (_, Value::Null) => {}
        (dest, other) => *dest = other,
    }
}

fn validation(err: serde_yaml::Error) -> ConfigError {
    ConfigError::Validation(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Demo {
        name: String,
        retries: u32,
        tags: Vec<String>,
    }

    impl Default for Demo {
        fn default() -> Self {
            Self {
                name: "demo".to_string(),
                retries: 3,
                tags: vec!["a".to_string()],
            }
        }
    }

    impl ConfigSpec for Demo {
        const FILE_NAME: &'static str = "demo.yml";

        fn fields() -> &'static [FieldMeta] {
            static FIELDS: [FieldMeta; 3] = [
                FieldMeta {
                    name: "name",
                    description: "名字",
                },
                FieldMeta {
                    name: "retries",
                    description: "重试次数\n0 表示不重试",
                },
                FieldMeta {
                    name: "tags",
                    description: "",
                },
            ];
            &FIELDS
        }
    }

    #[test]
    fn creates_commented_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config: Demo = load_or_create(None, Some(dir.path())).unwrap();
        assert_eq!(config, Demo::default());

        let text = fs::read_to_string(dir.path().join("demo.yml")).unwrap();
        assert!(text.starts_with("# 名字\nname: demo\n"));
        assert!(text.contains("# 重试次数\n# 0 表示不重试\nretries: 3\n"));
    }

    #[test]
    fn user_values_win_and_missing_fields_are_filled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yml");
        fs::write(&path, "retries: 9\ntags: [x, y]\n").unwrap();

        let config: Demo = load_or_create(Some(&path), None).unwrap();
        assert_eq!(config.name, "demo");
        assert_eq!(config.retries, 9);
        assert_eq!(config.tags, vec!["x", "y"]);

        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("name: demo"));
        assert!(rewritten.contains("retries: 9"));
    }

    #[test]
    fn broken_yaml_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.yml");
        fs::write(&path, "retries: [unclosed").unwrap();
        let err = load_or_create::<Demo>(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { path: p, .. } if p == path));
    }
}
