mod common;

use approx::assert_abs_diff_eq;
use common::*;
use vizij_dance_core::{
    apply_overlay, compute_offsets, default_bone_rules, find_bone_groups, Bone, BoneGroupKind,
    BoneTransform, ClipMixer, Mixer, ModelId, OverlayCoefficients, OverlayParams, Skeleton,
    StyleCatalog,
};

fn params(time: f64) -> OverlayParams {
    OverlayParams {
        time,
        tempo: 1.0,
        hip_intensity: 1.0,
        step_intensity: 1.0,
    }
}

fn stamped(mut sk: Skeleton) -> Skeleton {
    sk.model = Some(ModelId(1));
    sk
}

#[test]
fn offsets_are_a_pure_function_of_inputs() {
    let model = samba_model();
    let sk = stamped(model.skeleton);
    let groups = find_bone_groups(&sk, &default_bone_rules());
    let catalog = StyleCatalog::default();
    let k = OverlayCoefficients::default();

    for style in catalog.iter() {
        for t in [0.0, 0.37, 12.5, 1000.25] {
            let a = compute_offsets(&params(t), &style.motion, &groups, &k);
            let b = compute_offsets(&params(t), &style.motion, &groups, &k);
            assert_eq!(a, b);
        }
    }
}

#[test]
fn overlay_adds_to_the_base_pose() {
    let model = samba_model();
    let mut sk = stamped(model.skeleton);
    let groups = find_bone_groups(&sk, &default_bone_rules());
    let mut mixer = ClipMixer::new(&sk, model.clips);
    let h = mixer.create_handle(0).unwrap();
    mixer.play(h);
    mixer.advance(0.5, &mut sk);
    let base = sk.poses();

    let style = StyleCatalog::default().get("Samba Enredo").cloned().unwrap();
    let mut offsets = Vec::new();
    apply_overlay(
        &mut sk,
        &groups,
        &style.motion,
        &params(3.3),
        &OverlayCoefficients::default(),
        &mut offsets,
    );
    assert!(!offsets.is_empty());

    // several groups may touch one bone, so sum per bone first
    let mut expected = base.clone();
    for o in &offsets {
        expected[o.bone.index()].add_offset(o.translation, o.rotation);
    }
    for (i, bone) in sk.bones.iter().enumerate() {
        for axis in 0..3 {
            assert_abs_diff_eq!(bone.pose.translation[axis], expected[i].translation[axis], epsilon = 1e-6);
            assert_abs_diff_eq!(bone.pose.rotation[axis], expected[i].rotation[axis], epsilon = 1e-6);
        }
    }

    // next frame starts from the clip pose again, not from base + overlay
    mixer.advance(0.0, &mut sk);
    let again = sk.poses();
    assert_eq!(again, base);
}

#[test]
fn rig_without_hips_gets_no_hip_offset() {
    let sk = stamped(Skeleton::new(vec![
        Bone::new("Spine", None, BoneTransform::IDENTITY),
        Bone::new("L_Shoulder", Some(0), BoneTransform::IDENTITY),
        Bone::new("R_Shoulder", Some(0), BoneTransform::IDENTITY),
        Bone::new("L_Foot", Some(0), BoneTransform::IDENTITY),
    ]));
    let groups = find_bone_groups(&sk, &default_bone_rules());
    assert!(groups.get(BoneGroupKind::Hip).is_empty());

    let style = StyleCatalog::default().get("Samba Básico").cloned().unwrap();
    let offsets = compute_offsets(&params(1.0), &style.motion, &groups, &OverlayCoefficients::default());
    let touched: Vec<u32> = offsets.iter().map(|o| o.bone.0).collect();
    assert_eq!(touched, vec![1, 2, 0, 3]);
}

#[test]
fn zero_intensity_silences_hips_and_steps() {
    let sk = stamped(samba_model().skeleton);
    let groups = find_bone_groups(&sk, &default_bone_rules());
    let style = StyleCatalog::default().get("Samba Rock").cloned().unwrap();
    let p = OverlayParams {
        hip_intensity: 0.0,
        step_intensity: 0.0,
        ..params(2.2)
    };
    let offsets = compute_offsets(&p, &style.motion, &groups, &OverlayCoefficients::default());

    let silenced: Vec<_> = [BoneGroupKind::Hip, BoneGroupKind::Foot, BoneGroupKind::Knee]
        .iter()
        .flat_map(|k| groups.get(*k).iter().copied())
        .collect();
    let mut seen = 0;
    for o in offsets.iter().filter(|o| silenced.contains(&o.bone)) {
        seen += 1;
        assert_eq!(o.translation, [0.0; 3]);
        assert_eq!(o.rotation.map(f32::abs), [0.0; 3]);
    }
    assert!(seen > 0);
}

#[test]
fn hip_yaw_stays_within_its_envelope() {
    let sk = stamped(samba_model().skeleton);
    let groups = find_bone_groups(&sk, &default_bone_rules());
    let k = OverlayCoefficients::default();
    let hip = groups.get(BoneGroupKind::Hip)[0];
    for style in StyleCatalog::default().iter() {
        let bound = style.motion.hip.amplitude * 2.0 * k.hip_yaw;
        for step in 0..500 {
            let p = OverlayParams {
                hip_intensity: 2.0,
                ..params(step as f64 * 0.037)
            };
            let offsets = compute_offsets(&p, &style.motion, &groups, &k);
            let yaw = offsets.iter().find(|o| o.bone == hip).unwrap().rotation[1];
            assert!(yaw.abs() <= bound + 1e-7, "{}: yaw {yaw} > {bound}", style.id);
        }
    }
}

#[test]
fn stale_groups_are_never_applied() {
    let model = samba_model();
    let mut sk = stamped(model.skeleton);
    let groups = find_bone_groups(&sk, &default_bone_rules());
    sk.model = Some(ModelId(2));
    let before = sk.poses();

    let style = StyleCatalog::default().get("Samba Básico").cloned().unwrap();
    let mut offsets = Vec::new();
    apply_overlay(
        &mut sk,
        &groups,
        &style.motion,
        &params(1.0),
        &OverlayCoefficients::default(),
        &mut offsets,
    );
    assert!(offsets.is_empty());
    assert_eq!(sk.poses(), before);
}
