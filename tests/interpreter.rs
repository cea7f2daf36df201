use std::collections::HashMap;

use byteorder::{WriteBytesExt, BE};

use swell::classpath::ClassProvider;
use swell::data_types::Value;
use swell::errors::{RuntimeError, RuntimeErrorKind};
use swell::heap::HeapObject;
use swell::vm::Runner;

/// Serves class bytes out of a map, standing in for the jmod/directory
/// search of a real session.
struct MapProvider(HashMap<String, Vec<u8>>);

impl MapProvider {
    fn new(classes: Vec<(&str, ClassBytes)>) -> MapProvider {
        MapProvider(
            classes
                .into_iter()
                .map(|(name, builder)| (name.to_string(), builder.build()))
                .collect(),
        )
    }
}

impl ClassProvider for MapProvider {
    fn class_bytes(&mut self, binary_name: &str) -> Result<Vec<u8>, RuntimeError> {
        self.0.get(binary_name).cloned().ok_or_else(|| {
            RuntimeError::new(RuntimeErrorKind::ClassNotFound(binary_name.to_string()))
        })
    }
}

fn runner_for(classes: Vec<(&str, ClassBytes)>) -> Runner {
    Runner::new(Box::new(MapProvider::new(classes)))
}

fn u16b(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

/// Assembles class file bytes for the interpreter tests. Pool helpers
/// return the index they allocated; the caller wires them into code.
struct ClassBytes {
    pool: Vec<Vec<u8>>,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
}

impl ClassBytes {
    fn new(name: &str) -> ClassBytes {
        let mut builder = ClassBytes {
            pool: Vec::new(),
            access_flags: 0x0021, // public super
            this_class: 0,
            super_class: 0,
            fields: Vec::new(),
            methods: Vec::new(),
        };
        builder.this_class = builder.class_of(name);
        builder.super_class = builder.class_of("java/lang/Object");
        builder
    }

    fn next_pool_index(&self) -> u16 {
        let mut index = 1;
        for entry in &self.pool {
            index += if entry[0] == 5 || entry[0] == 6 { 2 } else { 1 };
        }
        index
    }

    fn push_pool(&mut self, entry: Vec<u8>) -> u16 {
        let index = self.next_pool_index();
        self.pool.push(entry);
        index
    }

    fn utf8(&mut self, text: &str) -> u16 {
        let mut entry = vec![1];
        entry.write_u16::<BE>(text.len() as u16).unwrap();
        entry.extend_from_slice(text.as_bytes());
        self.push_pool(entry)
    }

    fn integer(&mut self, value: i32) -> u16 {
        let mut entry = vec![3];
        entry.write_u32::<BE>(value as u32).unwrap();
        self.push_pool(entry)
    }

    fn class_of(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        let mut entry = vec![7];
        entry.write_u16::<BE>(name_index).unwrap();
        self.push_pool(entry)
    }

    fn string_of(&mut self, text: &str) -> u16 {
        let string_index = self.utf8(text);
        let mut entry = vec![8];
        entry.write_u16::<BE>(string_index).unwrap();
        self.push_pool(entry)
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let mut entry = vec![12];
        entry.write_u16::<BE>(name_index).unwrap();
        entry.write_u16::<BE>(descriptor_index).unwrap();
        self.push_pool(entry)
    }

    fn member_ref(&mut self, tag: u8, class_name: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class_of(class_name);
        let name_and_type_index = self.name_and_type(name, descriptor);
        let mut entry = vec![tag];
        entry.write_u16::<BE>(class_index).unwrap();
        entry.write_u16::<BE>(name_and_type_index).unwrap();
        self.push_pool(entry)
    }

    fn field_ref(&mut self, class_name: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(9, class_name, name, descriptor)
    }

    fn method_ref(&mut self, class_name: &str, name: &str, descriptor: &str) -> u16 {
        self.member_ref(10, class_name, name, descriptor)
    }

    fn add_field(&mut self, access: u16, name: &str, descriptor: &str) {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let mut bytes = Vec::new();
        bytes.write_u16::<BE>(access).unwrap();
        bytes.write_u16::<BE>(name_index).unwrap();
        bytes.write_u16::<BE>(descriptor_index).unwrap();
        bytes.write_u16::<BE>(0).unwrap();
        self.fields.push(bytes);
    }

    fn add_constant_field(&mut self, access: u16, name: &str, descriptor: &str, value: i32) {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let attribute_name = self.utf8("ConstantValue");
        let value_index = self.integer(value);
        let mut bytes = Vec::new();
        bytes.write_u16::<BE>(access).unwrap();
        bytes.write_u16::<BE>(name_index).unwrap();
        bytes.write_u16::<BE>(descriptor_index).unwrap();
        bytes.write_u16::<BE>(1).unwrap();
        bytes.write_u16::<BE>(attribute_name).unwrap();
        bytes.write_u32::<BE>(2).unwrap();
        bytes.write_u16::<BE>(value_index).unwrap();
        self.fields.push(bytes);
    }

    fn add_method(&mut self, access: u16, name: &str, descriptor: &str, code: Option<&[u8]>) {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let mut bytes = Vec::new();
        bytes.write_u16::<BE>(access).unwrap();
        bytes.write_u16::<BE>(name_index).unwrap();
        bytes.write_u16::<BE>(descriptor_index).unwrap();
        match code {
            Some(body) => {
                let attribute_name = self.utf8("Code");
                bytes.write_u16::<BE>(1).unwrap();
                bytes.write_u16::<BE>(attribute_name).unwrap();
                bytes.write_u32::<BE>(12 + body.len() as u32).unwrap();
                bytes.write_u16::<BE>(8).unwrap(); // max_stack
                bytes.write_u16::<BE>(4).unwrap(); // max_locals
                bytes.write_u32::<BE>(body.len() as u32).unwrap();
                bytes.extend_from_slice(body);
                bytes.write_u16::<BE>(0).unwrap();
                bytes.write_u16::<BE>(0).unwrap();
            }
            None => bytes.write_u16::<BE>(0).unwrap(),
        }
        self.methods.push(bytes);
    }

    fn build(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.write_u32::<BE>(0xCAFEBABE).unwrap();
        bytes.write_u16::<BE>(0).unwrap();
        bytes.write_u16::<BE>(61).unwrap();
        bytes.write_u16::<BE>(self.next_pool_index()).unwrap();
        for entry in &self.pool {
            bytes.extend_from_slice(entry);
        }
        bytes.write_u16::<BE>(self.access_flags).unwrap();
        bytes.write_u16::<BE>(self.this_class).unwrap();
        bytes.write_u16::<BE>(self.super_class).unwrap();
        bytes.write_u16::<BE>(0).unwrap();
        bytes.write_u16::<BE>(self.fields.len() as u16).unwrap();
        for field in &self.fields {
            bytes.extend_from_slice(field);
        }
        bytes.write_u16::<BE>(self.methods.len() as u16).unwrap();
        for method in &self.methods {
            bytes.extend_from_slice(method);
        }
        bytes.write_u16::<BE>(0).unwrap();
        bytes
    }
}

const ACC_PUBLIC: u16 = 0x0001;
const ACC_STATIC: u16 = 0x0008;
const ACC_NATIVE: u16 = 0x0100;
const MAIN_DESCRIPTOR: &str = "([Ljava/lang/String;)V";

#[test]
fn trivial_main_runs_and_leaves_the_stack_empty() {
    let mut main = ClassBytes::new("Main");
    main.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&[0xb1]));
    let mut runner = runner_for(vec![("Main", main)]);
    runner.run_main("Main").unwrap();
    assert!(runner.stack.is_empty());
    assert_eq!(runner.loader.initialized_classes(), vec!["Main"]);
}

#[test]
fn missing_main_method_is_reported() {
    let main = ClassBytes::new("Main");
    let mut runner = runner_for(vec![("Main", main)]);
    let error = runner.run_main("Main").unwrap_err();
    assert!(matches!(error.kind, RuntimeErrorKind::SymbolNotResolved(_)));
}

#[test]
fn missing_class_is_reported() {
    let mut runner = runner_for(vec![]);
    let error = runner.run_main("Missing").unwrap_err();
    assert!(matches!(
        error.kind,
        RuntimeErrorKind::ClassNotFound(name) if name == "Missing"
    ));
}

#[test]
fn arithmetic_flows_into_a_static_field() {
    let mut main = ClassBytes::new("Main");
    main.add_field(ACC_STATIC, "difference", "I");
    main.add_field(ACC_STATIC, "shifted", "I");
    let difference = main.field_ref("Main", "difference", "I");
    let shifted = main.field_ref("Main", "shifted", "I");
    let mut code = vec![0x10, 44, 0x10, 2, 0x64]; // bipush 44; bipush 2; isub
    code.push(0xb3);
    code.extend_from_slice(&u16b(difference));
    code.extend_from_slice(&[0x10, 0xe0, 0x05, 0x7a]); // bipush -32; iconst_2; ishr
    code.push(0xb3);
    code.extend_from_slice(&u16b(shifted));
    code.push(0xb1);
    main.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&code));
    let mut runner = runner_for(vec![("Main", main)]);
    runner.run_main("Main").unwrap();
    assert_eq!(
        runner.loader.static_get("Main", "difference").unwrap(),
        Value::Int(42)
    );
    assert_eq!(
        runner.loader.static_get("Main", "shifted").unwrap(),
        Value::Int(-8)
    );
}

#[test]
fn backward_branches_drive_a_counting_loop() {
    let mut main = ClassBytes::new("Main");
    main.add_field(ACC_STATIC, "result", "I");
    let result = main.field_ref("Main", "result", "I");
    #[rustfmt::skip]
    let mut code = vec![
        0x03,             //  0: iconst_0
        0x3b,             //  1: istore_0
        0x1a,             //  2: iload_0
        0x08,             //  3: iconst_5
        0xa1, 0x00, 0x06, //  4: if_icmplt -> 10
        0xa7, 0x00, 0x0a, //  7: goto -> 17
        0x1a,             // 10: iload_0
        0x02,             // 11: iconst_m1
        0x64,             // 12: isub
        0x3b,             // 13: istore_0
        0xa7, 0xff, 0xf4, // 14: goto -> 2
        0x1a,             // 17: iload_0
    ];
    code.push(0xb3);
    code.extend_from_slice(&u16b(result));
    code.push(0xb1);
    main.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&code));
    let mut runner = runner_for(vec![("Main", main)]);
    runner.run_main("Main").unwrap();
    assert_eq!(
        runner.loader.static_get("Main", "result").unwrap(),
        Value::Int(5)
    );
}

#[test]
fn ifeq_takes_the_branch_on_zero() {
    let mut main = ClassBytes::new("Main");
    main.add_field(ACC_STATIC, "result", "I");
    let result = main.field_ref("Main", "result", "I");
    #[rustfmt::skip]
    let mut code = vec![
        0x03,             //  0: iconst_0
        0x99, 0x00, 0x08, //  1: ifeq -> 9
        0x10, 9,          //  4: bipush 9
        0xa7, 0x00, 0x05, //  6: goto -> 11
        0x10, 7,          //  9: bipush 7
    ];
    code.push(0xb3);
    code.extend_from_slice(&u16b(result));
    code.push(0xb1);
    main.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&code));
    let mut runner = runner_for(vec![("Main", main)]);
    runner.run_main("Main").unwrap();
    assert_eq!(
        runner.loader.static_get("Main", "result").unwrap(),
        Value::Int(7)
    );
}

#[test]
fn ifnonnull_falls_through_on_null() {
    let mut main = ClassBytes::new("Main");
    main.add_field(ACC_STATIC, "result", "I");
    let result = main.field_ref("Main", "result", "I");
    #[rustfmt::skip]
    let mut code = vec![
        0x01,             //  0: aconst_null
        0xc7, 0x00, 0x08, //  1: ifnonnull -> 9
        0x10, 1,          //  4: bipush 1
        0xa7, 0x00, 0x05, //  6: goto -> 11
        0x10, 2,          //  9: bipush 2
    ];
    code.push(0xb3);
    code.extend_from_slice(&u16b(result));
    code.push(0xb1);
    main.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&code));
    let mut runner = runner_for(vec![("Main", main)]);
    runner.run_main("Main").unwrap();
    assert_eq!(
        runner.loader.static_get("Main", "result").unwrap(),
        Value::Int(1)
    );
}

#[test]
fn ifnonnull_branches_on_a_fresh_object() {
    let mut main = ClassBytes::new("Main");
    main.add_field(ACC_STATIC, "result", "I");
    let result = main.field_ref("Main", "result", "I");
    let this_class = main.this_class;
    #[rustfmt::skip]
    let mut code = vec![
        0xbb,             //  0: new Main
    ];
    code.extend_from_slice(&u16b(this_class));
    #[rustfmt::skip]
    code.extend_from_slice(&[
        0xc7, 0x00, 0x08, //  3: ifnonnull -> 11
        0x10, 1,          //  6: bipush 1
        0xa7, 0x00, 0x05, //  8: goto -> 13
        0x10, 2,          // 11: bipush 2
    ]);
    code.push(0xb3);
    code.extend_from_slice(&u16b(result));
    code.push(0xb1);
    main.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&code));
    let mut runner = runner_for(vec![("Main", main)]);
    runner.run_main("Main").unwrap();
    assert_eq!(
        runner.loader.static_get("Main", "result").unwrap(),
        Value::Int(2)
    );
}

#[test]
fn new_and_getfield_see_the_default_value() {
    let mut main = ClassBytes::new("Main");
    main.add_field(0, "x", "I");
    main.add_field(ACC_STATIC, "result", "I");
    let init = main.method_ref("Main", "<init>", "()V");
    let x = main.field_ref("Main", "x", "I");
    let result = main.field_ref("Main", "result", "I");
    let this_class = main.this_class;
    main.add_method(ACC_PUBLIC, "<init>", "()V", Some(&[0xb1]));
    let mut code = vec![0xbb];
    code.extend_from_slice(&u16b(this_class));
    code.push(0x59); // dup
    code.push(0xb7); // invokespecial <init>
    code.extend_from_slice(&u16b(init));
    code.push(0xb4); // getfield x
    code.extend_from_slice(&u16b(x));
    code.push(0xb3);
    code.extend_from_slice(&u16b(result));
    code.push(0xb1);
    main.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&code));
    let mut runner = runner_for(vec![("Main", main)]);
    runner.run_main("Main").unwrap();
    assert_eq!(
        runner.loader.static_get("Main", "result").unwrap(),
        Value::Int(0)
    );
    assert!(runner.stack.is_empty());
}

#[test]
fn putfield_stores_through_the_reference() {
    let mut main = ClassBytes::new("Main");
    main.add_field(0, "x", "I");
    main.add_field(ACC_STATIC, "result", "I");
    let x = main.field_ref("Main", "x", "I");
    let result = main.field_ref("Main", "result", "I");
    let this_class = main.this_class;
    // new; dup; dup; bipush 11; putfield x; getfield x; putstatic result
    let mut code = vec![0xbb];
    code.extend_from_slice(&u16b(this_class));
    code.extend_from_slice(&[0x59, 0x59, 0x10, 11]);
    code.push(0xb5);
    code.extend_from_slice(&u16b(x));
    code.push(0xb4);
    code.extend_from_slice(&u16b(x));
    code.push(0xb3);
    code.extend_from_slice(&u16b(result));
    code.push(0xb1);
    main.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&code));
    let mut runner = runner_for(vec![("Main", main)]);
    runner.run_main("Main").unwrap();
    assert_eq!(
        runner.loader.static_get("Main", "result").unwrap(),
        Value::Int(11)
    );
}

#[test]
fn invokestatic_matches_name_and_descriptor() {
    let mut main = ClassBytes::new("Main");
    main.add_field(ACC_STATIC, "result", "I");
    let result = main.field_ref("Main", "result", "I");
    let nullary = main.method_ref("Main", "f", "()I");
    // the (I)I overload comes first so a name-only lookup would pick it
    main.add_method(ACC_PUBLIC | ACC_STATIC, "f", "(I)I", Some(&[0x1a, 0xac]));
    main.add_method(ACC_PUBLIC | ACC_STATIC, "f", "()I", Some(&[0x04, 0xac]));
    let mut code = vec![0xb8];
    code.extend_from_slice(&u16b(nullary));
    code.push(0xb3);
    code.extend_from_slice(&u16b(result));
    code.push(0xb1);
    main.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&code));
    let mut runner = runner_for(vec![("Main", main)]);
    runner.run_main("Main").unwrap();
    assert_eq!(
        runner.loader.static_get("Main", "result").unwrap(),
        Value::Int(1)
    );
}

#[test]
fn invokevirtual_runs_the_instance_method() {
    let mut main = ClassBytes::new("Main");
    main.add_field(ACC_STATIC, "result", "I");
    let result = main.field_ref("Main", "result", "I");
    let get = main.method_ref("Main", "get", "()I");
    let this_class = main.this_class;
    main.add_method(ACC_PUBLIC, "get", "()I", Some(&[0x07, 0xac]));
    let mut code = vec![0xbb];
    code.extend_from_slice(&u16b(this_class));
    code.push(0xb6);
    code.extend_from_slice(&u16b(get));
    code.push(0xb3);
    code.extend_from_slice(&u16b(result));
    code.push(0xb1);
    main.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&code));
    let mut runner = runner_for(vec![("Main", main)]);
    runner.run_main("Main").unwrap();
    assert_eq!(
        runner.loader.static_get("Main", "result").unwrap(),
        Value::Int(4)
    );
}

#[test]
fn arrays_report_their_length() {
    let mut main = ClassBytes::new("Main");
    main.add_field(ACC_STATIC, "bytes", "I");
    main.add_field(ACC_STATIC, "objects", "I");
    let bytes_field = main.field_ref("Main", "bytes", "I");
    let objects_field = main.field_ref("Main", "objects", "I");
    let this_class = main.this_class;
    let mut code = vec![0x10, 3, 0xbc, 8, 0xbe]; // bipush 3; newarray byte; arraylength
    code.push(0xb3);
    code.extend_from_slice(&u16b(bytes_field));
    code.push(0x05); // iconst_2
    code.push(0xbd); // anewarray Main
    code.extend_from_slice(&u16b(this_class));
    code.push(0xbe);
    code.push(0xb3);
    code.extend_from_slice(&u16b(objects_field));
    code.push(0xb1);
    main.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&code));
    let mut runner = runner_for(vec![("Main", main)]);
    runner.run_main("Main").unwrap();
    assert_eq!(
        runner.loader.static_get("Main", "bytes").unwrap(),
        Value::Int(3)
    );
    assert_eq!(
        runner.loader.static_get("Main", "objects").unwrap(),
        Value::Int(2)
    );
}

#[test]
fn mutual_clinit_recursion_initializes_each_class_once() {
    fn side(name: &str, other: &str) -> ClassBytes {
        let mut class = ClassBytes::new(name);
        class.add_field(ACC_STATIC, "count", "I");
        let other_poke = class.method_ref(other, "poke", "()V");
        let own_count = class.field_ref(name, "count", "I");
        let mut clinit = vec![0xb8];
        clinit.extend_from_slice(&u16b(other_poke));
        clinit.push(0xb2);
        clinit.extend_from_slice(&u16b(own_count));
        clinit.extend_from_slice(&[0x02, 0x64]); // iconst_m1; isub => count + 1
        clinit.push(0xb3);
        clinit.extend_from_slice(&u16b(own_count));
        clinit.push(0xb1);
        class.add_method(ACC_STATIC, "<clinit>", "()V", Some(&clinit));
        class.add_method(ACC_PUBLIC | ACC_STATIC, "poke", "()V", Some(&[0xb1]));
        class
    }
    let mut runner = runner_for(vec![("A", side("A", "B")), ("B", side("B", "A"))]);
    runner.initialize_class("A").unwrap();
    assert_eq!(
        runner.loader.static_get("A", "count").unwrap(),
        Value::Int(1)
    );
    assert_eq!(
        runner.loader.static_get("B", "count").unwrap(),
        Value::Int(1)
    );
    assert_eq!(runner.loader.initialized_classes(), vec!["A", "B"]);
    assert_eq!(runner.loader.class_being_initialized(), None);
    assert!(runner.stack.is_empty());
}

#[test]
fn clinit_failure_leaves_the_class_uninitialized() {
    let mut class = ClassBytes::new("F");
    class.add_method(ACC_STATIC, "<clinit>", "()V", Some(&[0xc2])); // monitorenter
    let mut runner = runner_for(vec![("F", class)]);
    let error = runner.initialize_class("F").unwrap_err();
    assert!(matches!(
        error.kind,
        RuntimeErrorKind::UnknownInstruction(0xc2)
    ));
    assert_eq!(error.frames, vec!["F.<clinit>()".to_string()]);
    assert_eq!(runner.loader.initialization_state("F"), None);
    assert_eq!(runner.loader.class_being_initialized(), None);
}

#[test]
fn clinit_runs_before_main_observes_statics() {
    let mut main = ClassBytes::new("Main");
    main.add_field(ACC_STATIC, "seed", "I");
    main.add_field(ACC_STATIC, "result", "I");
    let seed = main.field_ref("Main", "seed", "I");
    let result = main.field_ref("Main", "result", "I");
    let mut clinit = vec![0x10, 41]; // bipush 41
    clinit.push(0xb3);
    clinit.extend_from_slice(&u16b(seed));
    clinit.push(0xb1);
    main.add_method(ACC_STATIC, "<clinit>", "()V", Some(&clinit));
    let mut code = vec![0xb2];
    code.extend_from_slice(&u16b(seed));
    code.extend_from_slice(&[0x02, 0x64]); // + 1
    code.push(0xb3);
    code.extend_from_slice(&u16b(result));
    code.push(0xb1);
    main.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&code));
    let mut runner = runner_for(vec![("Main", main)]);
    runner.run_main("Main").unwrap();
    assert_eq!(
        runner.loader.static_get("Main", "result").unwrap(),
        Value::Int(42)
    );
}

#[test]
fn native_intrinsic_pushes_without_a_frame() {
    let mut class_class = ClassBytes::new("java/lang/Class");
    class_class.add_method(
        ACC_PUBLIC | ACC_STATIC | ACC_NATIVE,
        "desiredAssertionStatus0",
        "(Ljava/lang/Class;)Z",
        None,
    );
    let mut main = ClassBytes::new("Main");
    main.add_field(ACC_STATIC, "result", "I");
    let result = main.field_ref("Main", "result", "I");
    let status = main.method_ref(
        "java/lang/Class",
        "desiredAssertionStatus0",
        "(Ljava/lang/Class;)Z",
    );
    let this_class = main.this_class;
    let mut code = vec![0x12, this_class as u8]; // ldc Main.class
    code.push(0xb8);
    code.extend_from_slice(&u16b(status));
    code.push(0xb3);
    code.extend_from_slice(&u16b(result));
    code.push(0xb1);
    main.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&code));
    let mut runner = runner_for(vec![("Main", main), ("java/lang/Class", class_class)]);
    runner.run_main("Main").unwrap();
    assert_eq!(
        runner.loader.static_get("Main", "result").unwrap(),
        Value::Int(1)
    );
    assert!(runner.stack.is_empty());
}

#[test]
fn unknown_native_method_is_reported() {
    let mut class = ClassBytes::new("Main");
    class.add_method(ACC_PUBLIC | ACC_STATIC | ACC_NATIVE, "mystery", "()V", None);
    let mystery = class.method_ref("Main", "mystery", "()V");
    let mut code = vec![0xb8];
    code.extend_from_slice(&u16b(mystery));
    code.push(0xb1);
    class.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&code));
    let mut runner = runner_for(vec![("Main", class)]);
    let error = runner.run_main("Main").unwrap_err();
    assert!(matches!(
        error.kind,
        RuntimeErrorKind::UnsupportedNative { class, name }
            if class == "Main" && name == "mystery"
    ));
}

#[test]
fn ldc_string_allocates_a_string_instance() {
    let mut string_class = ClassBytes::new("java/lang/String");
    string_class.add_field(0x0002, "value", "[B");
    string_class.add_field(0x0002, "coder", "B");
    let mut main = ClassBytes::new("Main");
    main.add_field(ACC_STATIC, "greeting", "Ljava/lang/String;");
    let greeting = main.field_ref("Main", "greeting", "Ljava/lang/String;");
    let hi = main.string_of("hi");
    let mut code = vec![0x12, hi as u8];
    code.push(0xb3);
    code.extend_from_slice(&u16b(greeting));
    code.push(0xb1);
    main.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&code));
    let mut runner = runner_for(vec![("Main", main), ("java/lang/String", string_class)]);
    runner.run_main("Main").unwrap();
    let Value::Reference(Some(id)) = runner.loader.static_get("Main", "greeting").unwrap() else {
        panic!("greeting should hold a string reference");
    };
    assert_eq!(runner.heap.field(id, "coder").unwrap(), Value::Byte(1));
    let Value::Reference(Some(value_id)) = runner.heap.field(id, "value").unwrap() else {
        panic!("value should hold a byte array reference");
    };
    let HeapObject::Array { items } = runner.heap.get(value_id).unwrap() else {
        panic!("value should be an array");
    };
    assert_eq!(items, &vec![Value::Byte(b'h' as i8), Value::Byte(b'i' as i8)]);
}

#[test]
fn system_register_natives_chains_into_init_phase1() {
    let mut system = ClassBytes::new("java/lang/System");
    system.add_field(ACC_STATIC, "booted", "I");
    let booted = system.field_ref("java/lang/System", "booted", "I");
    let register = system.method_ref("java/lang/System", "registerNatives", "()V");
    system.add_method(ACC_PUBLIC | ACC_STATIC | ACC_NATIVE, "registerNatives", "()V", None);
    let mut init_phase1 = vec![0x10, 99];
    init_phase1.push(0xb3);
    init_phase1.extend_from_slice(&u16b(booted));
    init_phase1.push(0xb1);
    system.add_method(ACC_STATIC, "initPhase1", "()V", Some(&init_phase1));
    let mut clinit = vec![0xb8];
    clinit.extend_from_slice(&u16b(register));
    clinit.push(0xb1);
    system.add_method(ACC_STATIC, "<clinit>", "()V", Some(&clinit));
    let mut runner = runner_for(vec![("java/lang/System", system)]);
    runner.initialize_class("java/lang/System").unwrap();
    assert_eq!(
        runner.loader.static_get("java/lang/System", "booted").unwrap(),
        Value::Int(99)
    );
}

#[test]
fn unknown_instruction_carries_a_backtrace() {
    let mut main = ClassBytes::new("Main");
    let helper = main.method_ref("Main", "helper", "()V");
    // monitorenter is not implemented
    main.add_method(ACC_PUBLIC | ACC_STATIC, "helper", "()V", Some(&[0xc2]));
    let mut code = vec![0xb8];
    code.extend_from_slice(&u16b(helper));
    code.push(0xb1);
    main.add_method(ACC_PUBLIC | ACC_STATIC, "main", MAIN_DESCRIPTOR, Some(&code));
    let mut runner = runner_for(vec![("Main", main)]);
    let error = runner.run_main("Main").unwrap_err();
    assert!(matches!(
        error.kind,
        RuntimeErrorKind::UnknownInstruction(0xc2)
    ));
    assert_eq!(
        error.frames,
        vec!["Main.helper()".to_string(), "Main.main()".to_string()]
    );
    assert!(runner.stack.is_empty());
}

#[test]
fn statics_are_seeded_with_defaults_and_constant_values() {
    let mut class = ClassBytes::new("E");
    class.add_constant_field(ACC_STATIC, "answer", "I", 99);
    class.add_field(ACC_STATIC, "big", "J");
    class.add_field(ACC_STATIC, "name", "Ljava/lang/String;");
    let mut runner = runner_for(vec![("E", class)]);
    runner.loader.load("E").unwrap();
    assert_eq!(runner.loader.static_get("E", "answer").unwrap(), Value::Int(99));
    assert_eq!(runner.loader.static_get("E", "big").unwrap(), Value::Long(0));
    assert_eq!(
        runner.loader.static_get("E", "name").unwrap(),
        Value::Reference(None)
    );
}
