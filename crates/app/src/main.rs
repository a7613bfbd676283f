//! Entry point for the OBJ viewer: logging + CLI flags.

use anyhow::Result;
use platform::ViewerConfig;

fn parse_backend_arg(args: &[String]) -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all(); // default = auto
    for arg in args {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{}', falling back to auto.", other);
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_size_args(args: &[String]) -> (u32, u32) {
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in args {
        if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    w = Some(pw);
                    h = Some(ph);
                }
            }
        }
    }

    (w.unwrap_or(800).max(1), h.unwrap_or(800).max(1))
}

fn parse_config(args: &[String]) -> ViewerConfig {
    let mut config = ViewerConfig::default();
    (config.width, config.height) = parse_size_args(args);
    config.backends = parse_backend_arg(args);

    for arg in args {
        if let Some(v) = arg.strip_prefix("--model=") {
            config.model_path = v.into();
        } else if let Some(v) = arg.strip_prefix("--color-map=") {
            config.color_map_path = v.into();
        } else if let Some(v) = arg.strip_prefix("--normal-map=") {
            config.normal_map_path = v.into();
        } else if let Some(v) = arg.strip_prefix("--scale=") {
            match v.parse::<f32>() {
                Ok(s) if s > 0.0 => config.model_scale = s,
                _ => log::warn!("Ignoring invalid --scale value '{v}'"),
            }
        } else if arg == "--no-reverse-winding" {
            config.reverse_winding = false;
        }
    }
    config
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = parse_config(&args);
    log::info!(
        "Starting OBJ viewer. Model: {}, window {}x{}, backends {:?}",
        config.model_path.display(),
        config.width,
        config.height,
        config.backends
    );

    platform::run(config)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_without_flags() {
        let config = parse_config(&[]);
        assert_eq!((config.width, config.height), (800, 800));
        assert_eq!(config.model_scale, 100.0);
        assert!(config.reverse_winding);
        assert_eq!(config.backends, wgpu::Backends::all());
    }

    #[test]
    fn size_flag_parses_both_dimensions() {
        let config = parse_config(&args(&["--size=1024x768"]));
        assert_eq!((config.width, config.height), (1024, 768));
    }

    #[test]
    fn malformed_size_keeps_default() {
        let config = parse_config(&args(&["--size=wide"]));
        assert_eq!((config.width, config.height), (800, 800));
    }

    #[test]
    fn backend_and_paths() {
        let config = parse_config(&args(&[
            "--gpu-backend=vulkan",
            "--model=meshes/thing.obj",
            "--scale=2.5",
            "--no-reverse-winding",
        ]));
        assert_eq!(config.backends, wgpu::Backends::VULKAN);
        assert_eq!(config.model_path.to_str(), Some("meshes/thing.obj"));
        assert_eq!(config.model_scale, 2.5);
        assert!(!config.reverse_winding);
    }

    #[test]
    fn invalid_scale_is_ignored() {
        let config = parse_config(&args(&["--scale=-3"]));
        assert_eq!(config.model_scale, 100.0);
    }
}
