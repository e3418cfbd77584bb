use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

use crate::{Exclusions, PaletteConfig, extract_palette};

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Extract the dominant colors of an encoded image (PNG, JPEG, ...).
///
/// Optional arguments take the same names the CLI accepts, e.g.
/// `quality = "high"`, `formula = "cie94"`, `exclude = "black,white"`,
/// `sort = "hue"`. Omitted ones fall back to [`PaletteConfig::default`].
///
/// Returns `{ palette: [{ hex, weight, fraction }], sampled, excluded }`.
#[wasm_bindgen]
pub fn dominant_colors(
    input: Vec<u8>,
    max_colors: usize,
    quality: Option<String>,
    formula: Option<String>,
    exclude: Option<String>,
    threshold: Option<f32>,
    sort: Option<String>,
) -> Result<Object, JsValue> {
    let mut config = PaletteConfig::new().max_colors(max_colors);
    if let Some(q) = quality {
        config.quality = q.parse().map_err(js_err)?;
    }
    if let Some(f) = formula {
        config.formula = f.parse().map_err(js_err)?;
    }
    if let Some(x) = exclude {
        config.exclusions = x.parse::<Exclusions>().map_err(js_err)?;
    }
    if let Some(t) = threshold {
        config.merge_threshold = t;
    }
    if let Some(s) = sort {
        config.sort = s.parse().map_err(js_err)?;
    }

    // ----------------------
    // Decode and extract
    // ----------------------
    let img = image::load_from_memory(&input)
        .map_err(|e| JsValue::from_str(&format!("Unable to decode image: {e}")))?;
    let palette = extract_palette(&img, &config).map_err(js_err)?;

    // ----------------------
    // Convert to JS types
    // ----------------------
    let palette_js = Array::new();
    for entry in &palette {
        let item = Object::new();
        Reflect::set(&item, &JsValue::from_str("hex"), &JsValue::from_str(&entry.hex()))?;
        Reflect::set(
            &item,
            &JsValue::from_str("weight"),
            &JsValue::from_f64(entry.weight as f64),
        )?;
        Reflect::set(
            &item,
            &JsValue::from_str("fraction"),
            &JsValue::from_f64(entry.fraction as f64),
        )?;
        palette_js.push(&item);
    }

    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("palette"), &palette_js)?;
    Reflect::set(
        &result,
        &JsValue::from_str("sampled"),
        &JsValue::from_f64(palette.sampled as f64),
    )?;
    Reflect::set(
        &result,
        &JsValue::from_str("excluded"),
        &JsValue::from_f64(palette.excluded as f64),
    )?;

    Ok(result)
}
