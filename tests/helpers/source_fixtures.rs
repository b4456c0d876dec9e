//! Common source code fixtures for tests.

// Resolution
pub const IMPORTER: &str = r#"
module M {
    import from N all;
    const integer a := foo;
    const integer b := bar;
}
"#;

pub const EXPORTER: &str = r#"
module N {
    const integer foo := 1;
    private const integer bar := 2;
}
"#;

pub const FRIEND_EXPORTER: &str = r#"
module B {
    friend module A;
    friend const integer shared := 1;
    private const integer hidden := 2;
    public const integer open := 3;
}
"#;

// Cycles
pub const ALIAS_CYCLE: &str = r#"
module M {
    type B A;
    type C B;
    type A C;
}
"#;

pub const IMPORT_CYCLE: [&str; 3] = [
    "module A { import from B all; }",
    "module B { import from C all; }",
    "module C { import from A all; }",
];

// Reparsing
pub const EDITABLE: &str = r#"module Edit {
    import from Other all;
    type integer Small (0 .. 9);
    type port P message { inout integer }
    type component Comp { port P p }
    const integer limit := 5;
    function run(in integer n) runs on Comp return integer {
        var integer x := n;
        { x := limit; }
        alt {
            [x > 0] p.receive { x := x - 1; }
            [else] { }
        }
        return x;
    }
    control {
        var integer r := limit;
    }
}
"#;

pub const OTHER: &str = "module Other { const integer unused := 0; }";
