// ABOUTME: Handlebars helpers available inside request body templates
// ABOUTME: Time stamps, nonces, environment lookups, encodings and request signing digests

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

fn str_param<'a>(h: &'a Helper, index: usize) -> Option<&'a str> {
    h.param(index).and_then(|v| v.value().as_str())
}

fn required_param<'a>(h: &'a Helper, name: &str) -> Result<&'a str, RenderError> {
    str_param(h, 0).ok_or_else(|| {
        RenderError::new(format!("{} helper requires a string parameter", name))
    })
}

/// `{{timestamp}}` or `{{timestamp "%Y%m%d"}}`
pub fn timestamp_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let format = str_param(h, 0).unwrap_or("%Y-%m-%d %H:%M:%S");
    out.write(&Utc::now().format(format).to_string())?;
    Ok(())
}

/// Milliseconds since the epoch, the usual cache-buster for form posts.
pub fn unix_millis_helper(
    _: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&Utc::now().timestamp_millis().to_string())?;
    Ok(())
}

pub fn uuid_helper(
    _: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&Uuid::new_v4().to_string())?;
    Ok(())
}

/// `{{env "NAME" "fallback"}}`
pub fn env_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let name = required_param(h, "env")?;
    let fallback = str_param(h, 1).unwrap_or("");
    let value = std::env::var(name).unwrap_or_else(|_| fallback.to_string());
    out.write(&value)?;
    Ok(())
}

pub fn base64_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let input = required_param(h, "base64")?;
    out.write(&BASE64.encode(input.as_bytes()))?;
    Ok(())
}

/// Lowercase hex SHA-256 of the parameter.
pub fn sha256_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let input = required_param(h, "sha256")?;
    out.write(&hex::encode(Sha256::digest(input.as_bytes())))?;
    Ok(())
}

pub fn upper_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&required_param(h, "upper")?.to_uppercase())?;
    Ok(())
}

pub fn lower_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&required_param(h, "lower")?.to_lowercase())?;
    Ok(())
}

/// `{{default value "fallback"}}` writes the fallback when value is empty or missing.
pub fn default_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let value = str_param(h, 0).unwrap_or("");
    if value.is_empty() {
        out.write(str_param(h, 1).unwrap_or(""))?;
    } else {
        out.write(value)?;
    }
    Ok(())
}

pub fn register_helpers(handlebars: &mut Handlebars) {
    handlebars.register_helper("timestamp", Box::new(timestamp_helper));
    handlebars.register_helper("unix_millis", Box::new(unix_millis_helper));
    handlebars.register_helper("uuid", Box::new(uuid_helper));
    handlebars.register_helper("env", Box::new(env_helper));
    handlebars.register_helper("base64", Box::new(base64_helper));
    handlebars.register_helper("sha256", Box::new(sha256_helper));
    handlebars.register_helper("upper", Box::new(upper_helper));
    handlebars.register_helper("lower", Box::new(lower_helper));
    handlebars.register_helper("default", Box::new(default_helper));
}
