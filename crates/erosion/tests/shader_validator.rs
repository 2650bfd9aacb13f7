use std::fs;
use std::path::Path;

#[test]
fn validate_all_shaders() {
    let shader_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/shaders");
    let mut errors = Vec::new();

    if !shader_dir.exists() {
        panic!("Shader directory not found: {:?}", shader_dir);
    }

    let mut count = 0;
    for entry in fs::read_dir(&shader_dir).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().map_or(false, |ext| ext == "wgsl") {
            validate_shader(&path, &mut errors);
            count += 1;
        }
    }

    assert!(count >= 2, "expected erosion.wgsl and draw.wgsl, found {}", count);
    if !errors.is_empty() {
        panic!("Shader validation failed:\n{}", errors.join("\n"));
    }
}

fn validate_shader(path: &Path, errors: &mut Vec<String>) {
    let source = fs::read_to_string(path).unwrap();
    let module = match naga::front::wgsl::parse_str(&source) {
        Ok(module) => module,
        Err(e) => {
            errors.push(format!(
                "Failed to parse {:?}:\n{}",
                path.file_name().unwrap(),
                e.emit_to_string(&source)
            ));
            return;
        }
    };

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );

    if let Err(e) = validator.validate(&module) {
        errors.push(format!("Failed to validate {:?}:\n{:?}", path.file_name().unwrap(), e));
    }
}

#[test]
fn every_compute_entry_point_uses_the_same_tile() {
    let source = erosion::program::EROSION_WGSL;
    let module = naga::front::wgsl::parse_str(source).unwrap();
    let compute: Vec<_> = module
        .entry_points
        .iter()
        .filter(|ep| ep.stage == naga::ShaderStage::Compute)
        .collect();
    assert_eq!(compute.len(), erosion::Kernel::ALL.len());
    for ep in compute {
        assert_eq!(ep.workgroup_size, [32, 32, 1], "{}", ep.name);
    }
}

/// True if `function` loads a whole `_data` element rather than single fields.
fn loads_whole_data_cell(module: &naga::Module, function: &naga::Function) -> bool {
    use naga::Expression;

    let is_data = |h: naga::Handle<Expression>| match function.expressions[h] {
        Expression::GlobalVariable(g) => {
            module.global_variables[g].name.as_deref() == Some("_data")
        }
        _ => false,
    };
    function.expressions.iter().any(|(_, expr)| match *expr {
        Expression::Load { pointer } => match function.expressions[pointer] {
            Expression::Access { base, .. } | Expression::AccessIndex { base, .. } => {
                is_data(base)
            }
            _ => false,
        },
        _ => false,
    })
}

#[test]
fn normal_pass_reads_only_height_fields() {
    let module = naga::front::wgsl::parse_str(erosion::program::EROSION_WGSL).unwrap();

    for (_, function) in module.functions.iter() {
        let name = function.name.as_deref().unwrap_or("");
        if name == "sample_surface" || name == "surface_normal" {
            assert!(
                !loads_whole_data_cell(&module, function),
                "{} loads a whole cell that GenerateNormals writes",
                name
            );
        }
    }
    let normals = module
        .entry_points
        .iter()
        .find(|ep| ep.name == "GenerateNormals")
        .unwrap();
    assert!(!loads_whole_data_cell(&module, &normals.function));
}
