use anyhow::{bail, Result};
use candle_core::{DType, Tensor};

/// Mean of the unmasked token states of each sequence, L2-normalised.
/// `hidden` is `[B,T,H]`, `attention_mask` is `[B,T]`; the result is `[B,H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, tokens, _) = hidden.dims3()?;
    if attention_mask.dims() != [batch, tokens] {
        bail!("attention mask {:?} does not match hidden states [{batch}, {tokens}, _]", attention_mask.dims());
    }
    let weights = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let summed = hidden.broadcast_mul(&weights.unsqueeze(2)?)?.sum(1)?;
    // an all-padding row keeps a zero vector instead of dividing by zero
    let counts = weights.sum_keepdim(1)?.maximum(1.0)?;
    l2_normalize_rows(&summed.broadcast_div(&counts)?)
}

fn l2_normalize_rows(rows: &Tensor) -> Result<Tensor> {
    let eps = match rows.dtype() {
        DType::F16 | DType::BF16 => 1e-6,
        _ => 1e-12,
    };
    let norms = rows.sqr()?.sum_keepdim(1)?.sqrt()?.affine(1.0, eps)?;
    Ok(rows.broadcast_div(&norms)?)
}
