//! Tiny ONNX graphs serialized by hand for tests.
//!
//! Only the handful of `onnx.proto` fields these graphs need are written:
//! ModelProto, GraphProto, NodeProto, AttributeProto, ValueInfoProto and
//! the tensor TypeProto. Float tensors only, opset 13.

use std::path::{Path, PathBuf};

const IR_VERSION: i64 = 7;
const OPSET_VERSION: i64 = 13;
const ELEM_FLOAT: i64 = 1;
const ATTR_INT: i64 = 2;
const ATTR_INTS: i64 = 7;

/// One dimension of a declared tensor shape.
#[derive(Clone, Copy)]
pub enum Dim {
    Fixed(i64),
    Symbolic(&'static str),
}

pub use self::Dim::{Fixed, Symbolic};

/// NHWC 112x112 input with a symbolic batch dimension.
pub const NHWC_DYNAMIC_BATCH: [Dim; 4] = [Symbolic("N"), Fixed(112), Fixed(112), Fixed(3)];
pub const NHWC: [Dim; 4] = [Fixed(1), Fixed(112), Fixed(112), Fixed(3)];
pub const NCHW: [Dim; 4] = [Fixed(1), Fixed(3), Fixed(112), Fixed(112)];

fn varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

fn int_field(buf: &mut Vec<u8>, field: u64, value: i64) {
    varint(buf, field << 3);
    varint(buf, value as u64);
}

fn bytes_field(buf: &mut Vec<u8>, field: u64, bytes: &[u8]) {
    varint(buf, (field << 3) | 2);
    varint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn tensor_type(dims: &[Dim]) -> Vec<u8> {
    let mut shape = Vec::new();
    for dim in dims {
        let mut d = Vec::new();
        match dim {
            Fixed(v) => int_field(&mut d, 1, *v),
            Symbolic(s) => bytes_field(&mut d, 2, s.as_bytes()),
        }
        bytes_field(&mut shape, 1, &d);
    }

    let mut tensor = Vec::new();
    int_field(&mut tensor, 1, ELEM_FLOAT);
    bytes_field(&mut tensor, 2, &shape);

    let mut type_proto = Vec::new();
    bytes_field(&mut type_proto, 1, &tensor);
    type_proto
}

fn value_info(name: &str, dims: &[Dim]) -> Vec<u8> {
    typed_value_info(name, &tensor_type(dims))
}

fn typed_value_info(name: &str, type_proto: &[u8]) -> Vec<u8> {
    let mut info = Vec::new();
    bytes_field(&mut info, 1, name.as_bytes());
    bytes_field(&mut info, 2, type_proto);
    info
}

fn attr_ints(name: &str, values: &[i64]) -> Vec<u8> {
    let mut attr = Vec::new();
    bytes_field(&mut attr, 1, name.as_bytes());
    for v in values {
        int_field(&mut attr, 8, *v);
    }
    int_field(&mut attr, 20, ATTR_INTS);
    attr
}

fn attr_int(name: &str, value: i64) -> Vec<u8> {
    let mut attr = Vec::new();
    bytes_field(&mut attr, 1, name.as_bytes());
    int_field(&mut attr, 3, value);
    int_field(&mut attr, 20, ATTR_INT);
    attr
}

fn node(op_type: &str, inputs: &[&str], outputs: &[&str], attrs: &[Vec<u8>]) -> Vec<u8> {
    let mut n = Vec::new();
    for i in inputs {
        bytes_field(&mut n, 1, i.as_bytes());
    }
    for o in outputs {
        bytes_field(&mut n, 2, o.as_bytes());
    }
    bytes_field(&mut n, 3, op_type.to_lowercase().as_bytes());
    bytes_field(&mut n, 4, op_type.as_bytes());
    for a in attrs {
        bytes_field(&mut n, 5, a);
    }
    n
}

fn model(nodes: &[Vec<u8>], inputs: &[Vec<u8>], outputs: &[Vec<u8>]) -> Vec<u8> {
    let mut graph = Vec::new();
    for n in nodes {
        bytes_field(&mut graph, 1, n);
    }
    bytes_field(&mut graph, 2, b"fixture");
    for i in inputs {
        bytes_field(&mut graph, 11, i);
    }
    for o in outputs {
        bytes_field(&mut graph, 12, o);
    }

    let mut opset = Vec::new();
    int_field(&mut opset, 2, OPSET_VERSION);

    let mut m = Vec::new();
    int_field(&mut m, 1, IR_VERSION);
    bytes_field(&mut m, 2, b"facematch-tests");
    bytes_field(&mut m, 7, &graph);
    bytes_field(&mut m, 8, &opset);
    m
}

/// `ReduceMean` over `axes` of a single float input.
///
/// Reducing the spatial axes turns an image into its per-channel mean, a
/// 3-dim "embedding" whose values are easy to predict.
pub fn reduce_mean(input: &[Dim], axes: &[i64], keepdims: bool, output: &[Dim]) -> Vec<u8> {
    let reduce = node(
        "ReduceMean",
        &["input"],
        &["embedding"],
        &[attr_ints("axes", axes), attr_int("keepdims", keepdims as i64)],
    );
    model(
        &[reduce],
        &[value_info("input", input)],
        &[value_info("embedding", output)],
    )
}

/// Channel-mean embedder for channels-last input: output `[batch, 3]`.
pub fn nhwc_channel_mean(input: &[Dim; 4]) -> Vec<u8> {
    reduce_mean(input, &[1, 2], false, &[input[0], Fixed(3)])
}

/// Channel-mean embedder for channels-first input: output `[batch, 3]`.
pub fn nchw_channel_mean(input: &[Dim; 4]) -> Vec<u8> {
    reduce_mean(input, &[2, 3], false, &[input[0], Fixed(3)])
}

/// Element-wise `Add` of two NHWC inputs.
pub fn two_inputs() -> Vec<u8> {
    let add = node("Add", &["a", "b"], &["sum"], &[]);
    model(
        &[add],
        &[value_info("a", &NHWC), value_info("b", &NHWC)],
        &[value_info("sum", &NHWC)],
    )
}

/// Wraps the NHWC input in a one-element sequence, so the output is not a tensor.
pub fn sequence_output() -> Vec<u8> {
    let construct = node("SequenceConstruct", &["input"], &["faces"], &[]);

    let mut sequence = Vec::new();
    bytes_field(&mut sequence, 1, &tensor_type(&NHWC));
    let mut seq_type = Vec::new();
    bytes_field(&mut seq_type, 4, &sequence);

    model(
        &[construct],
        &[value_info("input", &NHWC)],
        &[typed_value_info("faces", &seq_type)],
    )
}

pub fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write onnx fixture");
    path
}
